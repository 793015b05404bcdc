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

use anyhow::bail;
use zktv_api_client::BackendClient;
use zktv_cli::cli_args::Notify;
use zktv_types::SendMessageRequest;

pub async fn notify(opt: Notify, backend: BackendClient) -> anyhow::Result<()> {
    let request = match (opt.message, opt.template) {
        (Some(message), None) => SendMessageRequest::text(opt.to.as_str(), message),
        (None, Some(template)) => SendMessageRequest::template(opt.to.as_str(), template.into()),
        _ => bail!("pass exactly one of --message or --template"),
    };
    let sent = backend.send_message(&request).await?;
    println!("{} {}", sent.message_id, sent.status);
    Ok(())
}
