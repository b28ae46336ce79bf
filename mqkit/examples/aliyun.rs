use mqkit::aliyun::{AckOutcome, Client, Config};
use mqkit::{default_context, Result};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = default_context();
    let config = Config::default().from_env(&ctx);
    let client = Client::new(ctx, config)?;

    let topic = env::var("MQ_TOPIC").unwrap_or_else(|_| "mqkit-demo".to_string());
    let group = env::var("MQ_CONSUMER").unwrap_or_else(|_| "GID_mqkit_demo".to_string());

    // Publish a message
    let resp = client
        .producer(&topic)
        .publish_message("hello from mqkit", Some("demo"))
        .await?;
    println!("published: {:?} (request id {:?})", resp.body, resp.request_id);

    // Long poll for up to 3 seconds
    let consumer = client.consumer(&topic, &group, Some("demo"));
    let resp = consumer.consume_message(16, Some(3)).await?;
    let messages = resp.body.unwrap_or_default();
    for message in &messages {
        println!("received {}: {}", message.message_id, message.message_body);
    }

    // Acknowledge what we got
    let handles: Vec<_> = messages.iter().map(|m| m.receipt_handle.as_str()).collect();
    if !handles.is_empty() {
        match consumer.ack_message(&handles).await? {
            AckOutcome::AllAcked { .. } => println!("acked {} messages", handles.len()),
            AckOutcome::PartiallyFailed { errors, .. } => {
                for err in errors {
                    println!("ack failed for {}: {}", err.receipt_handle, err.error_code);
                }
            }
            AckOutcome::TotallyFailed(fault) => println!("ack rejected: {fault}"),
        }
    }

    Ok(())
}
