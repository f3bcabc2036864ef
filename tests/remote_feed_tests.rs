//! Remote feed tests against a mock NuGet V2 server

use mockito::Matcher;
use nupm::{InstalledPackage, NugetVersion, PackageIdentifier, RemoteFeedSource};

fn feed_body(entries: &[(&str, &str)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
      xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
"#,
    );
    for (id, version) in entries {
        body.push_str(&format!(
            r#"<entry>
  <title type="text">{id}</title>
  <content type="application/zip" src="https://example.com/package/{id}/{version}" />
  <m:properties>
    <d:Version>{version}</d:Version>
    <d:Description>desc</d:Description>
  </m:properties>
</entry>
"#
        ));
    }
    body.push_str("</feed>");
    body
}

fn installed(id: &str, version: &str) -> InstalledPackage {
    InstalledPackage {
        id: id.to_string(),
        version: NugetVersion::parse(version).unwrap(),
        version_literal: version.to_string(),
        manually_installed: true,
    }
}

#[test]
fn test_get_specific_package_picks_lowest_satisfying() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", Matcher::Regex("FindPackagesById".to_string()))
        .with_status(200)
        .with_body(feed_body(&[
            ("Newtonsoft.Json", "12.0.3"),
            ("Newtonsoft.Json", "13.0.1"),
            ("Newtonsoft.Json", "13.0.3"),
        ]))
        .create();

    let source = RemoteFeedSource::new("mock", &server.url(), None);
    let wanted = PackageIdentifier::new("Newtonsoft.Json", "[13.0,)").unwrap();
    let found = source.get_specific_package(&wanted).unwrap().unwrap();

    assert_eq!(found.version, NugetVersion::parse("13.0.1").unwrap());
    assert_eq!(found.source_name, "mock");
    mock.assert();
}

#[test]
fn test_search_parses_entries() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", Matcher::Regex("Search".to_string()))
        .with_status(200)
        .with_body(feed_body(&[("Alpha", "1.0"), ("Beta", "2.0")]))
        .create();

    let source = RemoteFeedSource::new("mock", &server.url(), None);
    let results = source.search("a", false, false).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "Alpha");
    assert_eq!(results[1].version, NugetVersion::parse("2.0").unwrap());
}

#[test]
fn test_get_updates_batches_requests() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", Matcher::Regex("GetUpdates".to_string()))
        .with_status(200)
        .with_body(feed_body(&[]))
        .expect(2)
        .create();

    // 12 installed ids need two batches of at most 10.
    let installed: Vec<InstalledPackage> = (0..12)
        .map(|i| installed(&format!("Package{}", i), "1.0"))
        .collect();

    let source = RemoteFeedSource::new("mock", &server.url(), None);
    let updates = source.get_updates(&installed, false, false).unwrap();
    assert!(updates.is_empty());
    mock.assert();
}

#[test]
fn test_http_error_maps_to_source_unavailable() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", Matcher::Regex("Search".to_string()))
        .with_status(500)
        .create();

    let source = RemoteFeedSource::new("mock", &server.url(), None);
    let err = source.search("a", false, false).unwrap_err();
    assert!(matches!(err, nupm::Error::SourceUnavailable { .. }));
}

#[test]
fn test_credentials_are_sent_as_basic_auth() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", Matcher::Regex("Search".to_string()))
        .match_header("authorization", Matcher::Regex("Basic ".to_string()))
        .with_status(200)
        .with_body(feed_body(&[]))
        .create();

    let source = RemoteFeedSource::new("mock", &server.url(), Some("s3cret".to_string()));
    source.search("a", false, false).unwrap();
    mock.assert();
}
