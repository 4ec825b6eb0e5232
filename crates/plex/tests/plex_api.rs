use collectarr_core::{ExternalId, MediaKind};
use collectarr_plex::{PlexError, PlexServer, Section};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn movie_section() -> Section {
    Section {
        key: "1".to_string(),
        title: "Movies".to_string(),
        kind: MediaKind::Movie,
    }
}

#[tokio::test]
async fn find_section_matches_title_and_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .and(query_param("X-Plex-Token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Directory": [
                    { "key": "1", "title": "Movies", "type": "movie" },
                    { "key": "2", "title": "TV Shows", "type": "show" },
                    { "key": "3", "title": "Music", "type": "artist" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();

    let movies = plex.find_section("Movies", MediaKind::Movie).await.unwrap();
    assert_eq!(movies.key, "1");

    let err = plex
        .find_section("Movies", MediaKind::Show)
        .await
        .unwrap_err();
    assert!(matches!(err, PlexError::LibraryNotFound(_)));
}

#[tokio::test]
async fn filter_items_sends_subfilters_and_parses_guids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .and(query_param("genre", "1234"))
        .and(query_param("videoResolution", "4k"))
        .and(query_param("includeGuids", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Metadata": [
                    {
                        "ratingKey": "101",
                        "title": "Jurassic Park",
                        "year": 1993,
                        "Guid": [{ "id": "tmdb://329" }]
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();
    let subfilters = vec![("video-resolution".to_string(), "4k".to_string())];
    let items = plex
        .filter_items(&movie_section(), "genre", "1234", &subfilters)
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].ids, vec![ExternalId::Tmdb(329)]);
}

#[tokio::test]
async fn resolve_tag_key_is_case_insensitive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/actor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Directory": [
                    { "key": "5555", "title": "Jeff Goldblum" },
                    { "key": "6666", "title": "Laura Dern" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();
    let key = plex
        .resolve_tag_key(&movie_section(), "actor", "jeff goldblum")
        .await
        .unwrap();
    assert_eq!(key.as_deref(), Some("5555"));

    let missing = plex
        .resolve_tag_key(&movie_section(), "actor", "Nobody")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn add_to_collection_tags_the_item() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "1"))
        .and(query_param("id", "101"))
        .and(query_param("collection[0].tag.tag", "Dinosaurs"))
        .and(query_param("X-Plex-Token", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();
    plex.add_to_collection(&movie_section(), "101", MediaKind::Movie, "Dinosaurs")
        .await
        .unwrap();
}

#[tokio::test]
async fn collections_named_requires_exact_title() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "18"))
        .and(query_param("title", "Dinosaurs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Metadata": [
                    { "ratingKey": "900", "title": "Dinosaurs", "subtype": "movie" },
                    { "ratingKey": "901", "title": "Dinosaurs Documentaries", "subtype": "movie" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();
    let collections = plex
        .collections_named(&movie_section(), "Dinosaurs")
        .await
        .unwrap();

    assert_eq!(collections.len(), 1);
    assert_eq!(collections[0].rating_key, "900");
    assert_eq!(collections[0].subtype, MediaKind::Movie);
}

#[tokio::test]
async fn collection_edits_hit_the_section_and_metadata_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/library/sections/1/all"))
        .and(query_param("type", "18"))
        .and(query_param("id", "900"))
        .and(query_param("summary.value", "Movies about dinosaurs"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/library/metadata/900/posters"))
        .and(query_param("url", "http://images.example/dinosaurs.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "secret").unwrap();
    plex.set_collection_summary(&movie_section(), "900", "Movies about dinosaurs")
        .await
        .unwrap();
    plex.upload_poster("900", "http://images.example/dinosaurs.png")
        .await
        .unwrap();
}

#[tokio::test]
async fn server_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let plex = PlexServer::new(&server.uri(), "bad-token").unwrap();
    let err = plex.sections().await.unwrap_err();
    assert!(matches!(err, PlexError::Server(_)));
}
