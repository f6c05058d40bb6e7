//! Parsing of the `dict`/`list`/`key`/`item` content vocabulary and of the metadata shared by feeds and entries.

use crate::atom::Value;
use crate::convert::{to_datetime, to_url};
use crate::errors::ParseError;
use crate::xml::{Element, Node, XmlCursor};
use crate::Result;
use chrono::{DateTime, FixedOffset};
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use url::Url;

/// Reads the single value inside `owner`, whose start tag was consumed last, including its end tag.
///
/// The value is `None` when the element has no child node, a trimmed scalar for a text child, or a nested
/// dictionary or list.
pub(crate) fn read_value<'a>(cursor: &'a mut XmlCursor, owner: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
    Box::pin(async move {
        let depth = cursor.depth();
        let mut value = None;

        loop {
            match cursor.next_significant().await? {
                Node::End(_) if cursor.depth() < depth => return Ok(value),
                _ if value.is_some() => {
                    return Err(ParseError::at(owner, format!("expected single value in <{}>", owner)).into())
                }
                Node::Text(text) => value = Some(Value::Scalar(text.trim().to_owned())),
                Node::Start(element) => match element.local_name() {
                    "dict" => value = Some(read_dict(cursor).await?),
                    "list" => value = Some(read_list(cursor).await?),
                    other => return Err(ParseError::unexpected(other, owner).into()),
                },
                Node::End(name) => return Err(ParseError::unexpected(&name.local, owner).into()),
                Node::Eof => return Err(ParseError::end_of_document(owner).into()),
            }
        }
    })
}

async fn read_dict(cursor: &mut XmlCursor) -> Result<Value> {
    let mut entries = BTreeMap::new();

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "key" => {
                let name = element
                    .attribute("name")
                    .ok_or_else(|| ParseError::missing_attribute("name", "key"))?
                    .to_owned();
                let value = read_value(cursor, "key").await?.unwrap_or_else(|| Value::Scalar(String::new()));
                insert_property(&mut entries, &name, value)?;
            }
            Node::Start(element) => return Err(ParseError::unexpected(element.local_name(), "dict").into()),
            Node::End(_) => return Ok(Value::Map(entries)),
            Node::Text(text) => return Err(ParseError::at("dict", format!("unexpected text {:?} in <dict>", text)).into()),
            Node::Eof => return Err(ParseError::end_of_document("dict").into()),
        }
    }
}

async fn read_list(cursor: &mut XmlCursor) -> Result<Value> {
    let mut items = vec![];

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "item" => {
                let value = read_value(cursor, "item").await?.unwrap_or_else(|| Value::Scalar(String::new()));
                items.push(value);
            }
            Node::Start(element) => return Err(ParseError::unexpected(element.local_name(), "list").into()),
            Node::End(_) => return Ok(Value::List(items)),
            Node::Text(text) => return Err(ParseError::at("list", format!("unexpected text {:?} in <list>", text)).into()),
            Node::Eof => return Err(ParseError::end_of_document("list").into()),
        }
    }
}

/// Stores `value` under its capitalised name, nesting one level for `outer:inner` names.
fn insert_property(entries: &mut BTreeMap<String, Value>, name: &str, value: Value) -> Result<()> {
    let parts: Vec<&str> = name.split(':').collect();

    match parts.as_slice() {
        [name] => {
            entries.insert(capitalize(name), value);
        }
        [outer, inner] => {
            let nested = entries
                .entry(capitalize(outer))
                .or_insert_with(|| Value::Map(BTreeMap::new()));
            match nested {
                Value::Map(nested) => {
                    nested.insert(capitalize(inner), value);
                }
                _ => {
                    return Err(
                        ParseError::at("key", format!("property {} conflicts with scalar property {}", name, outer))
                            .into(),
                    )
                }
            }
        }
        _ => return Err(ParseError::at("key", format!("invalid property name {}", name)).into()),
    }

    Ok(())
}

/// Upper-cases the first letter of a property name, as property names are stored.
pub(crate) fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Reads `<author><name>…</name></author>` after the `author` start tag.
pub(crate) async fn read_author(cursor: &mut XmlCursor) -> Result<String> {
    let mut name = None;

    loop {
        match cursor.next_significant().await? {
            Node::Start(element) if element.local_name() == "name" => name = Some(cursor.read_text().await?),
            Node::Start(_) => cursor.skip_element().await?,
            Node::End(_) => break,
            Node::Text(_) => {}
            Node::Eof => return Err(ParseError::end_of_document("author").into()),
        }
    }

    name.map(|name| name.trim().to_owned())
        .ok_or_else(|| ParseError::missing("name", "author").into())
}

pub(crate) async fn read_trimmed(cursor: &mut XmlCursor) -> Result<String> {
    Ok(cursor.read_text().await?.trim().to_owned())
}

pub(crate) async fn read_url(cursor: &mut XmlCursor) -> Result<Url> {
    Ok(to_url(&cursor.read_text().await?)?)
}

pub(crate) async fn read_timestamp(cursor: &mut XmlCursor) -> Result<DateTime<FixedOffset>> {
    Ok(to_datetime(&cursor.read_text().await?)?)
}

/// Reads the `rel` and `href` attributes of a `link` element and skips its content.
pub(crate) async fn read_link(cursor: &mut XmlCursor, element: &Element) -> Result<(String, String)> {
    let rel = element
        .attribute("rel")
        .ok_or_else(|| ParseError::missing_attribute("rel", "link"))?
        .to_owned();
    let href = element
        .attribute("href")
        .ok_or_else(|| ParseError::missing_attribute("href", "link"))?
        .to_owned();
    cursor.skip_element().await?;

    Ok((rel, href))
}

/// Resolves link targets against the `id` with a trailing slash. The last link of a relation wins.
pub(crate) fn resolve_links(id: &Url, links: Vec<(String, String)>) -> Result<BTreeMap<String, Url>> {
    let base = Url::parse(&format!("{}/", id.as_str().trim_end_matches('/')))?;

    links
        .into_iter()
        .map(|(rel, href)| Ok((rel, base.join(&href)?)))
        .collect()
}

/// Formats a timestamp as `M/d/yyyy h:mm:ss AM` in its own offset.
pub(crate) fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%-m/%-d/%Y %-I:%M:%S %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    async fn parse(xml: &'static str) -> Result<Option<Value>> {
        let mut cursor = XmlCursor::new(xml);
        cursor.read_to_following(&["content"]).await?;
        read_value(&mut cursor, "content").await
    }

    fn map(entries: &[(&str, Value)]) -> Value {
        Value::Map(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[tokio::test]
    async fn test_empty_content_is_absent() {
        assert_eq!(None, parse("<content/>").await.unwrap());
        assert_eq!(None, parse("<content>\n   </content>").await.unwrap());
    }

    #[tokio::test]
    async fn test_text_content_is_trimmed() {
        assert_eq!(Some(Value::from("ok")), parse("<content>\n  ok \n</content>").await.unwrap());
    }

    #[tokio::test]
    async fn test_dict_names_are_capitalised() {
        let value = parse(r#"<content><s:dict xmlns:s="x"><s:key name="disabled">0</s:key><s:key name="homePath">$SPLUNK_DB</s:key></s:dict></content>"#)
            .await
            .unwrap();

        assert_eq!(
            Some(map(&[("Disabled", Value::from("0")), ("HomePath", Value::from("$SPLUNK_DB"))])),
            value
        );
    }

    #[tokio::test]
    async fn test_two_part_names_nest_one_level() {
        let value = parse(
            r#"<content><dict>
                <key name="eai:acl"><dict><key name="owner">admin</key></dict></key>
                <key name="eai:appName">search</key>
                <key name="eai:userName">admin</key>
            </dict></content>"#,
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(Some("admin"), value.lookup(&["Eai", "Acl", "Owner"]).and_then(Value::as_str));
        assert_eq!(Some("search"), value.lookup(&["Eai", "AppName"]).and_then(Value::as_str));
        assert_eq!(3, value.get("Eai").and_then(Value::as_map).map(BTreeMap::len).unwrap());
    }

    #[tokio::test]
    async fn test_three_part_names_fail() {
        let actual_error = parse(r#"<content><dict><key name="a:b:c">x</key></dict></content>"#)
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("key")));
    }

    #[tokio::test]
    async fn test_nested_lists_keep_order() {
        let value = parse(
            r#"<content><list><item>b</item><item><list><item>c</item></list></item><item/></list></content>"#,
        )
        .await
        .unwrap();

        assert_eq!(
            Some(Value::List(vec![
                Value::from("b"),
                Value::List(vec![Value::from("c")]),
                Value::from(""),
            ])),
            value
        );
    }

    #[tokio::test]
    async fn test_multiple_values_fail() {
        let actual_error = parse("<content><dict/><list/></content>")
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.message() == "expected single value in <content>"));
    }

    #[tokio::test]
    async fn test_unexpected_dict_child_fails() {
        let actual_error = parse("<content><dict><item>x</item></dict></content>")
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("item")));
    }

    #[tokio::test]
    async fn test_key_without_name_fails() {
        let actual_error = parse("<content><dict><key>x</key></dict></content>")
            .await
            .expect_err("Operation must fail");

        assert!(matches!(actual_error, Error::Parse(e) if e.element() == Some("key")));
    }

    #[test]
    fn test_links_resolve_under_id() {
        let id = Url::parse("https://localhost:8089/services/search/jobs/1392687998.313").unwrap();
        let links = resolve_links(
            &id,
            vec![
                ("events".to_owned(), "events".to_owned()),
                ("alternate".to_owned(), "/services/search/jobs/1392687998.313".to_owned()),
                ("events".to_owned(), "events?offset=0".to_owned()),
            ],
        )
        .unwrap();

        assert_eq!(2, links.len());
        assert_eq!(
            "https://localhost:8089/services/search/jobs/1392687998.313/events?offset=0",
            links["events"].as_str()
        );
        assert_eq!(
            "https://localhost:8089/services/search/jobs/1392687998.313",
            links["alternate"].as_str()
        );
    }

    #[test]
    fn test_formats_timestamp_in_own_offset() {
        let timestamp = to_datetime("2014-02-17T17:46:39-08:00").unwrap();

        assert_eq!("2/17/2014 5:46:39 PM", format_timestamp(&timestamp));
    }
}
