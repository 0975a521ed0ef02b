use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::{PortraitError, PortraitResult};
use crate::igdb::auth::{CredentialExchange, TokenCache};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_call_timing;

const QUERY_TIMEOUT_SECONDS: u64 = 3;

/// Raw game record as returned by the `games` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameFacts {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_release_date: i64,
    #[serde(default)]
    pub genres: Option<Vec<u64>>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct GenreRecord {
    name: String,
}

/// Read access to a game metadata service.
pub trait GameDatabase: Send + Sync {
    /// Best match for `name`, or `None` when the search comes back empty.
    fn find_game(&self, name: &str) -> impl Future<Output = PortraitResult<Option<GameFacts>>> + Send;

    /// Genre names for `ids`, in the order the service returns them.
    fn genre_names(&self, ids: &[u64]) -> impl Future<Output = PortraitResult<Vec<String>>> + Send;
}

pub fn games_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        "search \"{escaped}\"; fields name, first_release_date, genres, summary;\nwhere category = 0;\nlimit 1;"
    )
}

pub fn genres_query(ids: &[u64]) -> String {
    let ids = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("fields name; where id = ({ids});")
}

pub fn parse_games(body: &str) -> PortraitResult<Option<GameFacts>> {
    let games: Vec<GameFacts> = serde_json::from_str(body)
        .map_err(|err| PortraitError::MetadataService(format!("Invalid games response: {err}")))?;
    Ok(games.into_iter().next())
}

pub fn parse_genres(body: &str) -> PortraitResult<Vec<String>> {
    let genres: Vec<GenreRecord> = serde_json::from_str(body)
        .map_err(|err| PortraitError::MetadataService(format!("Invalid genres response: {err}")))?;
    Ok(genres.into_iter().map(|genre| genre.name).collect())
}

pub struct IgdbClient<E> {
    base_url: Url,
    client_id: String,
    tokens: Arc<TokenCache<E>>,
}

impl<E: CredentialExchange> IgdbClient<E> {
    pub fn new(base_url: &str, client_id: &str, tokens: Arc<TokenCache<E>>) -> PortraitResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| {
            PortraitError::MetadataService(format!("Invalid IGDB base URL '{base_url}': {err}"))
        })?;
        Ok(IgdbClient {
            base_url,
            client_id: client_id.to_string(),
            tokens,
        })
    }

    fn endpoint(&self, name: &str) -> PortraitResult<Url> {
        self.base_url
            .join(name)
            .map_err(|err| PortraitError::MetadataService(format!("Invalid IGDB endpoint {name}: {err}")))
    }

    async fn query(&self, endpoint: &str, body: String) -> PortraitResult<String> {
        let credential = self.tokens.get_token().await?;
        let url = self.endpoint(endpoint)?;
        info!("Calling IGDB endpoint {} with query: {}", url, body.replace('\n', " "));

        let metadata = json!({ "query": &body });
        log_call_timing("igdb", endpoint, Some(metadata), move || async move {
            let response = get_http_client()
                .post(url)
                .header("Content-Type", "text/plain")
                .header("Client-ID", self.client_id.as_str())
                .bearer_auth(&credential.access_token)
                .body(body)
                .timeout(Duration::from_secs(QUERY_TIMEOUT_SECONDS))
                .send()
                .await
                .map_err(|err| PortraitError::MetadataService(format!("IGDB {endpoint} request failed: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PortraitError::MetadataService(format!(
                    "IGDB {endpoint} request failed with status {status}"
                )));
            }

            response
                .text()
                .await
                .map_err(|err| PortraitError::MetadataService(format!("Invalid IGDB {endpoint} response: {err}")))
        })
        .await
    }
}

impl<E: CredentialExchange> GameDatabase for IgdbClient<E> {
    async fn find_game(&self, name: &str) -> PortraitResult<Option<GameFacts>> {
        let body = self.query("games", games_query(name)).await?;
        parse_games(&body)
    }

    async fn genre_names(&self, ids: &[u64]) -> PortraitResult<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = self.query("genres", genres_query(ids)).await?;
        parse_genres(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::igdb::auth::tests::CountingExchange;

    #[test]
    fn builds_game_search_query() {
        assert_eq!(
            games_query("Tekken 7"),
            "search \"Tekken 7\"; fields name, first_release_date, genres, summary;\nwhere category = 0;\nlimit 1;"
        );
    }

    #[test]
    fn escapes_quotes_in_game_names() {
        let query = games_query("The \"Quoted\" Game");
        assert!(query.starts_with("search \"The \\\"Quoted\\\" Game\";"));
    }

    #[test]
    fn builds_genre_filter() {
        assert_eq!(genres_query(&[4]), "fields name; where id = (4);");
        assert_eq!(genres_query(&[12, 31, 5]), "fields name; where id = (12,31,5);");
    }

    #[test]
    fn parses_first_game() {
        let body = r#"[{"id":7498,"first_release_date":1424217600,"genres":[4],"name":"Tekken 7","summary":"Experience the epic conclusion."}]"#;
        let game = parse_games(body).unwrap().unwrap();
        assert_eq!(game.name, "Tekken 7");
        assert_eq!(game.first_release_date, 1_424_217_600);
        assert_eq!(game.genres, Some(vec![4]));
        assert_eq!(game.summary, "Experience the epic conclusion.");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let game = parse_games(r#"[{"id":1,"name":"Unknown"}]"#).unwrap().unwrap();
        assert_eq!(game.first_release_date, 0);
        assert_eq!(game.genres, None);
        assert_eq!(game.summary, "");
    }

    #[test]
    fn empty_search_is_not_found() {
        assert_eq!(parse_games("[]").unwrap(), None);
    }

    #[test]
    fn malformed_payloads_are_service_errors() {
        assert!(matches!(
            parse_games(r#"{"message":"Authorization Failure"}"#),
            Err(PortraitError::MetadataService(_))
        ));
        assert!(matches!(
            parse_genres("not json"),
            Err(PortraitError::MetadataService(_))
        ));
    }

    #[test]
    fn parses_genres_in_service_order() {
        let body = r#"[{"id":31,"name":"Adventure"},{"id":4,"name":"Fighting"}]"#;
        assert_eq!(parse_genres(body).unwrap(), vec!["Adventure", "Fighting"]);
    }

    #[test]
    fn endpoints_join_onto_base() {
        let tokens = Arc::new(TokenCache::new(CountingExchange::new(60)));
        let client = IgdbClient::new("https://api.igdb.com/v4/", "client", tokens).unwrap();
        assert_eq!(
            client.endpoint("games").unwrap().as_str(),
            "https://api.igdb.com/v4/games"
        );
    }

    #[test]
    fn rejects_invalid_base_url() {
        let tokens = Arc::new(TokenCache::new(CountingExchange::new(60)));
        assert!(IgdbClient::new("not a url", "client", tokens).is_err());
    }

    #[tokio::test]
    async fn empty_genre_list_skips_the_service() {
        let exchange = CountingExchange::new(60);
        let calls = exchange.calls.clone();
        let tokens = Arc::new(TokenCache::new(exchange));
        let client = IgdbClient::new("https://api.igdb.com/v4/", "client", tokens).unwrap();

        assert!(client.genre_names(&[]).await.unwrap().is_empty());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
