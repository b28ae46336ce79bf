use crate::mock::{assert_signed, client, client_with_instance, MockHttpSend};
use http::{Method, StatusCode};
use mqkit_aliyun_mq::{Fault, MessageProperties, PublishResult, XmlElement};
use mqkit_core::hash::base64_md5;
use mqkit_core::{ErrorKind, Result};
use pretty_assertions::assert_eq;

const PUBLISHED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Message xmlns="http://mq.aliyuncs.com/doc/v1/">
  <MessageId>m1</MessageId>
  <MessageBodyMD5>d1</MessageBodyMD5>
</Message>"#;

#[tokio::test]
async fn test_publish_message() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(201, PUBLISHED);
    let producer = client(&mock).producer("t1");

    let resp = producer.publish_message("hello mq", Some("tag-a")).await?;
    assert_eq!(resp.code, StatusCode::CREATED);
    assert_eq!(resp.request_id.as_deref(), Some("5F3A8C2D1E0B4A7F"));
    assert_eq!(
        resp.body,
        Some(PublishResult {
            message_id: "m1".to_string(),
            message_body_md5: "d1".to_string(),
        })
    );

    let req = mock.last_request();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.resource(), "/topics/t1/messages");
    assert_eq!(req.headers["content-type"], "text/xml;charset=utf-8");
    assert_eq!(req.headers["content-md5"], base64_md5(&req.body).as_str());
    assert_eq!(
        req.headers["content-length"],
        req.body.len().to_string().as_str()
    );
    assert!(!req.headers.contains_key("security-token"));
    assert_signed(&req);

    let sent = XmlElement::parse(req.body_str())?;
    assert_eq!(sent.name(), "Message");
    assert_eq!(sent.child_text("MessageBody"), Some("hello mq"));
    assert_eq!(sent.child_text("MessageTag"), Some("tag-a"));
    Ok(())
}

#[tokio::test]
async fn test_publish_message_with_instance_and_properties() -> Result<()> {
    let mock = MockHttpSend::new().reply_xml(201, PUBLISHED);
    let producer = client_with_instance(&mock, Some("MQ_INST_1")).producer("orders");
    assert_eq!(producer.instance_id(), Some("MQ_INST_1"));

    let properties = MessageProperties::new()
        .with_message_key("order-42")
        .with_property("region", "hz");
    producer
        .publish_message_with_properties("body", None, &properties)
        .await?;

    let req = mock.last_request();
    assert_eq!(req.resource(), "/topics/orders/messages?ns=MQ_INST_1");
    assert_signed(&req);

    let sent = XmlElement::parse(req.body_str())?;
    assert_eq!(sent.child("MessageTag"), None);
    assert_eq!(
        sent.child_text("Properties"),
        Some("KEYS:order-42|region:hz|")
    );
    Ok(())
}

#[tokio::test]
async fn test_publish_message_fault() {
    let mock = MockHttpSend::new().reply_xml(
        404,
        "<Error><Code>TopicNotExist</Code><Message>no such topic</Message><RequestId>abc</RequestId><HostId>h1</HostId></Error>",
    );

    let err = client(&mock)
        .producer("missing")
        .publish_message("hello", None)
        .await
        .expect_err("publish must fail");
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(
        Fault::from_error(&err),
        Some(&Fault {
            code: "TopicNotExist".to_string(),
            message: "no such topic".to_string(),
            request_id: "abc".to_string(),
            host_id: "h1".to_string(),
        })
    );
}

#[tokio::test]
async fn test_publish_message_rejects_bad_properties() {
    let mock = MockHttpSend::new();
    let properties = MessageProperties::new().with_property("a|b", "c");

    let err = client(&mock)
        .producer("t1")
        .publish_message_with_properties("hello", None, &properties)
        .await
        .expect_err("bad property must be rejected");
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_publish_message_rejects_duplicate_message_key() {
    let mock = MockHttpSend::new().reply_xml(201, PUBLISHED);
    let properties = MessageProperties::new()
        .with_message_key("a")
        .with_property("KEYS", "b");

    let err = client(&mock)
        .producer("t1")
        .publish_message_with_properties("hello", None, &properties)
        .await
        .expect_err("KEYS set twice must be rejected");
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_publish_message_transport_error() {
    let mock = MockHttpSend::new();

    let err = client(&mock)
        .producer("t1")
        .publish_message("hello", None)
        .await
        .expect_err("transport failure must surface");
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(mock.requests().len(), 1);
}
