mod common;

use splunk_sdk::ArgumentSet;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_export_search_reads_sections_in_order() -> splunk_sdk::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/servicesNS/admin/search/search/jobs/export"))
        .and(query_param("search", "search index=_internal | stats count"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version='1.0' encoding='UTF-8'?>
<results preview='1'>
<meta><fieldOrder><field>count</field></fieldOrder></meta>
<result offset='0'><field k='count'><value><text>1204</text></value></field></result>
</results>
<?xml version='1.0' encoding='UTF-8'?>
<results preview='0'>
<meta><fieldOrder><field>count</field></fieldOrder></meta>
<result offset='0'><field k='count'><value><text>2318</text></value></field></result>
</results>"#,
        ))
        .mount(&server)
        .await;
    let service = common::service(&server);

    let mut reader = service
        .export_search("search index=_internal | stats count", &ArgumentSet::new())
        .await?;
    let mut sections = vec![];
    while let Some(mut stream) = reader.next_stream().await? {
        let preview = stream.is_preview();
        while let Some(record) = stream.read_record().await? {
            sections.push((preview, record.get("count").unwrap().to_string()));
        }
    }

    assert_eq!(vec![(true, "1204".to_owned()), (false, "2318".to_owned())], sections);

    Ok(())
}
