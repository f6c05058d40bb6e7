#![allow(dead_code)]

use splunk_sdk::{Namespace, Scheme, Service, ServiceConfig};
use wiremock::MockServer;

pub fn service(server: &MockServer) -> Service {
    let config = ServiceConfig::default()
        .with_scheme(Scheme::Http)
        .with_host(server.address().ip().to_string())
        .with_port(server.address().port())
        .with_namespace(Namespace::new("admin", "search"));

    Service::new(&config).unwrap()
}

pub const SERVER_INFO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:s="http://dev.splunk.com/ns/rest">
  <title>server-info</title>
  <id>https://localhost:8089/services/server/info</id>
  <updated>2014-02-17T17:46:39-08:00</updated>
  <author><name>Splunk</name></author>
  <entry>
    <title>server-info</title>
    <id>https://localhost:8089/services/server/info/server-info</id>
    <updated>2014-02-17T17:46:39-08:00</updated>
    <author><name>system</name></author>
    <content type="text/xml">
      <s:dict>
        <s:key name="serverName">Dnoble-WIN10</s:key>
        <s:key name="version">6.0.1</s:key>
        <s:key name="guid">0B9C2F0A-3D8C-4E0B-A4BD-9B0A5E5C6F21</s:key>
        <s:key name="isFree">0</s:key>
      </s:dict>
    </content>
  </entry>
</feed>"#;
