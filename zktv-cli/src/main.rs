/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

use clap::Parser;
mod modes;

use modes::notify::notify;
use modes::streams::streams;
use modes::watch::watch;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::util::SubscriberInitExt;
use zktv_cli::cli_args::{Mode, Opt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Library crates log through `log`; `try_init` also installs the bridge.
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .finish()
        .try_init()?;

    let opt = Opt::parse();
    let backend = opt.backend.client()?;
    debug!("using backend {}", backend.base_url());

    match opt.mode {
        Mode::Streams(s) => streams(s, backend).await?,
        Mode::Watch(w) => watch(w, backend).await?,
        Mode::Notify(n) => notify(n, backend).await?,
    };

    Ok(())
}
