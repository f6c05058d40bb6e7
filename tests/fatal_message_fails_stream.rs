mod common;

use splunk_sdk::{ArgumentSet, Error, Severity};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fatal_message_fails_stream() -> splunk_sdk::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/servicesNS/admin/search/search/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response>
  <messages>
    <msg type="FATAL">Unknown search command 'serach'.</msg>
  </messages>
</response>"#,
        ))
        .mount(&server)
        .await;
    let service = common::service(&server);

    let mut results = service.oneshot_search("serach index=_internal", &ArgumentSet::new()).await?;
    let actual_error = results.read_record().await.expect_err("Operation must fail");

    assert!(matches!(
        actual_error,
        Error::Request(e) if e.severity() == Some(Severity::Fatal)
            && e.to_string() == "FATAL: Unknown search command 'serach'."
    ));

    Ok(())
}
