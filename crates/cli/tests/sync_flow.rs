use std::io::Write;

use collectarr_cli::sync::{self, SyncContext};
use collectarr_config::{Config, ImageServerConfig};
use collectarr_core::MediaKind;
use collectarr_plex::{PlexServer, Section};
use collectarr_providers::ImdbList;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(collections_yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
plex:
  url: http://localhost:32400
  token: plex-token
  movie_library: Movies
collections:
{collections_yaml}"#
    )
    .unwrap();
    file
}

fn context(plex_server: &MockServer, image_server: Option<&MockServer>) -> SyncContext {
    let image_server = match image_server {
        Some(server) => ImageServerConfig {
            host: server.address().ip().to_string(),
            port: server.address().port(),
        },
        None => ImageServerConfig::default(),
    };

    SyncContext {
        plex: PlexServer::new(&plex_server.uri(), "plex-token").unwrap(),
        movie_section: Section {
            key: "1".to_string(),
            title: "Movies".to_string(),
            kind: MediaKind::Movie,
        },
        show_section: None,
        tmdb: None,
        trakt: None,
        radarr: None,
        imdb: ImdbList::new(),
        image_server,
        http: reqwest::Client::new(),
        skip_radarr: true,
    }
}

#[tokio::test]
async fn genre_method_resolves_the_tag_and_tags_matches() {
    let plex = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/genre"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Directory": [{ "key": "1234", "title": "Dinosaurs" }]
            }
        })))
        .mount(&plex)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .and(query_param("genre", "1234"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "101", "title": "Jurassic Park", "year": 1993 }
                ]
            }
        })))
        .mount(&plex)
        .await;
    Mock::given(method("PUT"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "1"))
        .and(query_param("id", "101"))
        .and(query_param("collection[0].tag.tag", "Dinosaurs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&plex)
        .await;

    let file = write_config("  Dinosaurs:\n    genres: Dinosaurs\n");
    let config = Config::load(file.path()).unwrap();
    let ctx = context(&plex, None);

    sync::run(&ctx, &config, None).await.unwrap();
}

#[tokio::test]
async fn details_update_summary_and_fall_back_to_the_image_server() {
    let images = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images/Dinosaurs"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&images)
        .await;
    let poster_url = format!(
        "http://{}:{}/images/Dinosaurs",
        images.address().ip(),
        images.address().port()
    );

    let plex = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "18"))
        .and(query_param("title", "Dinosaurs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "900", "title": "Dinosaurs", "subtype": "movie" }
                ]
            }
        })))
        .mount(&plex)
        .await;
    Mock::given(method("PUT"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "18"))
        .and(query_param("id", "900"))
        .and(query_param("summary.value", "Movies about dinosaurs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&plex)
        .await;
    Mock::given(method("POST"))
        .and(path("/library/metadata/900/posters"))
        .and(query_param("url", poster_url.as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&plex)
        .await;

    let file = write_config(
        "  Dinosaurs:\n    details:\n      summary: Movies about dinosaurs\n",
    );
    let config = Config::load(file.path()).unwrap();
    let ctx = context(&plex, Some(&images));

    sync::run(&ctx, &config, None).await.unwrap();
}

#[tokio::test]
async fn unknown_collection_filter_is_an_error() {
    let plex = MockServer::start().await;
    let file = write_config("  Dinosaurs:\n    genres: Dinosaurs\n");
    let config = Config::load(file.path()).unwrap();
    let ctx = context(&plex, None);

    let err = sync::run(&ctx, &config, Some("No Such Collection"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No Such Collection"));
}
