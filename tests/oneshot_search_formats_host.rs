mod common;

use splunk_sdk::ArgumentSet;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_oneshot_search_formats_host() -> splunk_sdk::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/servicesNS/admin/search/search/jobs"))
        .and(body_string_contains("exec_mode=oneshot"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version='1.0' encoding='UTF-8'?>
<results preview="false">
  <meta><fieldOrder><field>host</field></fieldOrder></meta>
  <result offset='0'>
    <field k='host'>
      <value><text>Dnoble-WIN10</text></value>
    </field>
  </result>
</results>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    let service = common::service(&server);

    let mut results = service
        .oneshot_search("search index=_internal | head 1", &ArgumentSet::new())
        .await?;
    let record = results.read_record().await?.unwrap();

    assert!(!results.is_preview());
    assert_eq!("Dnoble-WIN10", record.get("host").unwrap().to_string());
    assert!(results.read_record().await?.is_none());

    Ok(())
}
