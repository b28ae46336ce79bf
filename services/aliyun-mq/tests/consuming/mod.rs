use crate::mock::{assert_signed, client, client_with_instance, MockHttpSend};
use http::{Method, StatusCode};
use mqkit_aliyun_mq::{AckError, AckOutcome, Fault, RequestOptions, XmlElement};
use mqkit_core::{ErrorKind, Result};
use pretty_assertions::assert_eq;
use std::time::Duration;

const MESSAGES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Messages xmlns="http://mq.aliyuncs.com/doc/v1/">
  <Message>
    <MessageId>m1</MessageId>
    <ReceiptHandle>rh-1</ReceiptHandle>
    <MessageBodyMD5>d1</MessageBodyMD5>
    <MessageBody>first</MessageBody>
    <PublishTime>1646122354000</PublishTime>
    <FirstConsumeTime>1646122355000</FirstConsumeTime>
    <NextConsumeTime>1646122415000</NextConsumeTime>
    <ConsumedTimes>1</ConsumedTimes>
    <MessageTag>tag-a</MessageTag>
    <Properties>KEYS:order-42|</Properties>
  </Message>
  <Message>
    <MessageId>m2</MessageId>
    <ReceiptHandle>rh-2</ReceiptHandle>
    <MessageBodyMD5>d2</MessageBodyMD5>
    <MessageBody>second</MessageBody>
    <ConsumedTimes>3</ConsumedTimes>
  </Message>
</Messages>"#;

const ACK_ERRORS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Errors xmlns="http://mq.aliyuncs.com/doc/v1/">
  <Error>
    <ErrorCode>ReceiptHandleError</ErrorCode>
    <ErrorMessage>The receipt handle you provide is not valid.</ErrorMessage>
    <ReceiptHandle>rh-1</ReceiptHandle>
  </Error>
  <Error>
    <ErrorCode>ReceiptHandleError</ErrorCode>
    <ErrorMessage>The receipt handle you provide is not valid.</ErrorMessage>
    <ReceiptHandle>rh-2</ReceiptHandle>
  </Error>
</Errors>"#;

#[tokio::test]
async fn test_consume_message() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(200, MESSAGES);
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let resp = consumer.consume_message(16, None).await?;
    assert_eq!(resp.code, StatusCode::OK);
    assert_eq!(resp.request_id.as_deref(), Some("5F3A8C2D1E0B4A7F"));

    let messages = resp.body.expect("messages must be returned");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message_id, "m1");
    assert_eq!(messages[0].receipt_handle, "rh-1");
    assert_eq!(messages[0].message_body, "first");
    assert_eq!(messages[0].message_tag.as_deref(), Some("tag-a"));
    assert_eq!(messages[0].message_key(), Some("order-42"));
    assert_eq!(messages[1].message_id, "m2");
    assert_eq!(messages[1].consumed_times, 3);
    assert_eq!(messages[1].message_tag, None);

    let req = mock.last_request();
    assert_eq!(req.method, Method::GET);
    assert_eq!(
        req.resource(),
        "/topics/t1/messages?consumer=GID_test&numOfMessages=16"
    );
    assert!(req.body.is_empty());
    assert!(!req.headers.contains_key("content-md5"));
    assert_signed(&req);
    Ok(())
}

#[tokio::test]
async fn test_consume_message_query() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(200, MESSAGES);
    let consumer =
        client_with_instance(&mock, Some("MQ_INST_1")).consumer("t1", "GID_test", Some("a||b"));
    assert_eq!(consumer.tag(), Some("a||b"));

    consumer.consume_message(3, Some(5)).await?;

    let req = mock.last_request();
    assert_eq!(
        req.resource(),
        "/topics/t1/messages?consumer=GID_test&tag=a||b&numOfMessages=3&waitseconds=5&ns=MQ_INST_1"
    );
    assert_signed(&req);
    Ok(())
}

#[tokio::test]
async fn test_consume_message_empty() -> Result<()> {
    let mock = MockHttpSend::new()
        .reply_xml(200, r#"<Messages xmlns="http://mq.aliyuncs.com/doc/v1/"></Messages>"#)
        .reply_empty(200);
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let resp = consumer.consume_message(16, Some(1)).await?;
    assert_eq!(resp.code, StatusCode::OK);
    assert_eq!(resp.request_id.as_deref(), Some("5F3A8C2D1E0B4A7F"));
    assert!(resp.body.unwrap_or_default().is_empty());

    let resp = consumer.consume_message(16, Some(1)).await?;
    assert_eq!(resp.code, StatusCode::OK);
    assert!(resp.body.is_none());
    Ok(())
}

#[tokio::test]
async fn test_consume_message_skips_malformed_records() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(
        200,
        r#"<Messages xmlns="http://mq.aliyuncs.com/doc/v1/">
  <Message><MessageId>m1</MessageId><MessageBody>no handle</MessageBody></Message>
  <Message><MessageId>m2</MessageId><ReceiptHandle>rh-2</ReceiptHandle><PublishTime>yesterday</PublishTime></Message>
  <Message><MessageId>m3</MessageId><ReceiptHandle>rh-3</ReceiptHandle><MessageBody>ok</MessageBody></Message>
</Messages>"#,
    );
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let messages = consumer
        .consume_message(16, None)
        .await?
        .body
        .expect("messages must be returned");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_id, "m3");
    assert_eq!(messages[0].receipt_handle, "rh-3");
    Ok(())
}

#[tokio::test]
async fn test_consume_message_not_exist() {
    let mock = MockHttpSend::new().reply_xml(
        404,
        "<Error><Code>MessageNotExist</Code><Message>Message not exist.</Message><RequestId>r1</RequestId><HostId>h1</HostId></Error>",
    );
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let err = consumer
        .consume_message(16, Some(1))
        .await
        .expect_err("fault must be raised");
    let fault = Fault::from_error(&err).expect("fault must be attached");
    assert!(fault.is_message_not_exist());
}

#[tokio::test]
async fn test_consume_message_timeout() {
    #[derive(Debug)]
    struct Stalled;

    #[async_trait::async_trait]
    impl mqkit_core::HttpSend for Stalled {
        async fn http_send(
            &self,
            _: http::Request<bytes::Bytes>,
        ) -> Result<http::Response<bytes::Bytes>> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Err(mqkit_core::Error::unexpected("unreachable"))
        }
    }

    let client = mqkit_aliyun_mq::Client::new(
        mqkit_core::Context::new().with_http_send(Stalled),
        mqkit_aliyun_mq::Config {
            endpoint: Some(crate::mock::ENDPOINT.to_string()),
            access_key_id: Some("ak".to_string()),
            access_key_secret: Some("sk".to_string()),
            ..Default::default()
        },
    )
    .expect("config must be valid");
    let consumer = client
        .consumer("t1", "GID_test", None)
        .with_request_options(RequestOptions::new().with_timeout(Duration::from_millis(50)));

    let err = consumer
        .consume_message(1, Some(30))
        .await
        .expect_err("long poll must time out");
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}

#[tokio::test]
async fn test_ack_message_all_acked() -> Result<()> {
    let mock = MockHttpSend::new().reply_empty(204);
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let outcome = consumer.ack_message(&["rh-1", "rh-2"]).await?;
    assert_eq!(
        outcome,
        AckOutcome::AllAcked {
            code: StatusCode::NO_CONTENT,
            request_id: Some("5F3A8C2D1E0B4A7F".to_string()),
        }
    );

    let req = mock.last_request();
    assert_eq!(req.method, Method::DELETE);
    assert_eq!(req.resource(), "/topics/t1/messages?consumer=GID_test");
    assert_signed(&req);

    let sent = XmlElement::parse(req.body_str())?;
    assert_eq!(sent.name(), "ReceiptHandles");
    let handles: Vec<_> = sent
        .children_named("ReceiptHandle")
        .map(|h| h.text().into_value())
        .collect();
    assert_eq!(handles, vec!["rh-1", "rh-2"]);
    Ok(())
}

#[tokio::test]
async fn test_ack_message_partially_failed() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(200, ACK_ERRORS);
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let handles = vec!["rh-1".to_string(), "rh-2".to_string(), "rh-3".to_string()];
    let outcome = consumer.ack_message(&handles).await?;

    let error = |handle: &str| AckError {
        error_code: "ReceiptHandleError".to_string(),
        error_message: "The receipt handle you provide is not valid.".to_string(),
        receipt_handle: handle.to_string(),
    };
    assert_eq!(
        outcome,
        AckOutcome::PartiallyFailed {
            code: StatusCode::OK,
            request_id: Some("5F3A8C2D1E0B4A7F".to_string()),
            errors: vec![error("rh-1"), error("rh-2")],
        }
    );
    assert!(!outcome.is_all_acked());
    Ok(())
}

#[tokio::test]
async fn test_ack_message_totally_failed() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(
        400,
        "<Error><Code>InvalidArgument</Code><Message>bad request format</Message><RequestId>r2</RequestId><HostId>h2</HostId></Error>",
    );
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let outcome = consumer.ack_message(&["rh-1"]).await?;
    assert_eq!(
        outcome,
        AckOutcome::TotallyFailed(Fault {
            code: "InvalidArgument".to_string(),
            message: "bad request format".to_string(),
            request_id: "r2".to_string(),
            host_id: "h2".to_string(),
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_ack_message_fault_raised_through_into_result() {
    let mock = MockHttpSend::new().reply_xml(
        400,
        "<Error><Code>InvalidArgument</Code><Message>bad request format</Message><RequestId>r2</RequestId><HostId>h2</HostId></Error>",
    );
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let acked = async {
        let outcome = consumer.ack_message(&["rh-1"]).await?.into_result()?;
        Ok::<_, mqkit_core::Error>(outcome)
    };
    let err = acked.await.expect_err("total failure must surface with `?`");
    assert_eq!(err.kind(), ErrorKind::Service);
    let fault = Fault::from_error(&err).expect("fault must be attached");
    assert_eq!(fault.code, "InvalidArgument");
    assert_eq!(fault.request_id, "r2");
}

#[tokio::test]
async fn test_ack_message_errors() {
    let mock = MockHttpSend::new();
    let consumer = client(&mock).consumer("t1", "GID_test", None);

    let err = consumer
        .ack_message::<&str>(&[])
        .await
        .expect_err("empty handles must be rejected");
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.requests().is_empty());

    let err = consumer
        .ack_message(&["rh-1"])
        .await
        .expect_err("transport failure must surface");
    assert_eq!(err.kind(), ErrorKind::Unexpected);
}
