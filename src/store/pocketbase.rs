use crate::config::StoreSettings;
use crate::error::{HerdbookError, Result};
use crate::store::{AnimalLookup, FileUrlResolver};
use crate::transit::plan::{TransitRecord, TransitRecordDraft};
use crate::types::{Animal, LivestockRecord};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const FULL_LIST_PAGE_SIZE: u32 = 200;

/// Client for the hosted record store (PocketBase REST API)
pub struct PocketBaseClient {
    client: Client,
    base_url: String,
    livestock_collection: String,
    transit_collection: String,
    auth_token: Option<String>,
    max_retry_elapsed: Duration,
}

/// One page of a record listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage<T> {
    page: u32,
    /// -1 when the listing was requested with `skipTotal`
    total_pages: i64,
    items: Vec<T>,
}

impl PocketBaseClient {
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            livestock_collection: settings.livestock_collection.clone(),
            transit_collection: settings.transit_collection.clone(),
            auth_token: settings.auth_token.clone(),
            max_retry_elapsed: settings.max_retry_elapsed(),
        })
    }

    fn records_url(&self, collection: &str) -> String {
        format!("{}/api/collections/{}/records", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.records_url(collection), id)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(header::AUTHORIZATION, token.as_str()),
            None => request,
        }
    }

    /// Send a request, retrying connection failures, timeouts and 5xx/429
    /// responses with exponential backoff
    async fn send_with_retry<F>(&self, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..ExponentialBackoff::default()
        };

        let build = &build;
        backoff::future::retry(policy, move || async move {
            match self.authorize(build()).send().await {
                Ok(response) if is_transient_status(response.status()) => {
                    warn!("Record store responded {}, retrying", response.status());
                    Err(backoff::Error::transient(HerdbookError::Store(format!(
                        "record store responded {}",
                        response.status()
                    ))))
                }
                Ok(response) => Ok(response),
                Err(e) if e.is_timeout() || e.is_connect() => {
                    warn!("Record store request failed: {}, retrying", e);
                    Err(backoff::Error::transient(HerdbookError::Http(e)))
                }
                Err(e) => Err(backoff::Error::permanent(HerdbookError::Http(e))),
            }
        })
        .await
    }

    /// Fetch a single record by id; a 404 is `Ok(None)`
    #[instrument(skip(self))]
    pub async fn get_one<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        let url = self.record_url(collection, id);
        let response = self.send_with_retry(|| self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("Record {}/{} not found", collection, id);
            return Ok(None);
        }

        decode(response).await.map(Some)
    }

    /// First record matching a filter expression, if any
    #[instrument(skip(self))]
    pub async fn get_first_matching<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &str,
    ) -> Result<Option<T>> {
        let url = self.records_url(collection);
        let response = self
            .send_with_retry(|| {
                self.client.get(&url).query(&[
                    ("page", "1"),
                    ("perPage", "1"),
                    ("skipTotal", "1"),
                    ("filter", filter),
                ])
            })
            .await?;

        let page: ListPage<T> = decode(response).await?;
        Ok(page.items.into_iter().next())
    }

    /// Every record matching an optional filter, walking all pages
    #[instrument(skip(self))]
    pub async fn get_full_list<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>> {
        let url = self.records_url(collection);
        let per_page = FULL_LIST_PAGE_SIZE.to_string();
        let mut records = Vec::new();
        let mut page_number = 1u32;

        loop {
            let page_param = page_number.to_string();
            let response = self
                .send_with_retry(|| {
                    let mut request = self
                        .client
                        .get(&url)
                        .query(&[("page", page_param.as_str()), ("perPage", per_page.as_str())]);
                    if let Some(filter) = filter {
                        request = request.query(&[("filter", filter)]);
                    }
                    request
                })
                .await?;

            let page: ListPage<T> = decode(response).await?;
            let fetched = page.items.len();
            records.extend(page.items);

            if fetched == 0 || i64::from(page.page) >= page.total_pages {
                break;
            }
            page_number += 1;
        }

        debug!("Fetched {} records from {}", records.len(), collection);
        Ok(records)
    }

    #[instrument(skip(self, body))]
    pub async fn create<B, T>(&self, collection: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.records_url(collection);
        let response = self.send_with_retry(|| self.client.post(&url).json(body)).await?;
        decode(response).await
    }

    #[instrument(skip(self, body))]
    pub async fn update<B, T>(&self, collection: &str, id: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.record_url(collection, id);
        let response = self.send_with_retry(|| self.client.patch(&url).json(body)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(HerdbookError::NotFound(format!("{}/{}", collection, id)));
        }

        decode(response).await
    }

    /// Delete a record; one that is already gone counts as deleted
    #[instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.record_url(collection, id);
        let response = self.send_with_retry(|| self.client.delete(&url)).await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        let text = response.text().await?;
        Err(HerdbookError::Store(format!(
            "deleting {}/{} responded {}: {}",
            collection, id, status, text
        )))
    }

    /// Public URL of a file attached to a record
    pub fn collection_file_url(&self, collection: &str, record_id: &str, filename: &str) -> String {
        format!("{}/api/files/{}/{}/{}", self.base_url, collection, record_id, filename)
    }

    /// Whether the record store answers its health endpoint
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/api/health", self.base_url);
        let response = self.authorize(self.client.get(&url)).send().await?;
        Ok(response.status().is_success())
    }

    /// Store the transit record, then mark every listed animal as in transit.
    ///
    /// If any animal cannot be marked, the animals already marked are cleared
    /// and the record is deleted before the first error is returned.
    #[instrument(skip(self, draft), fields(livestock = draft.livestock.len()))]
    pub async fn dispatch_transit(&self, draft: &TransitRecordDraft) -> Result<TransitRecord> {
        let record: TransitRecord = self.create(&self.transit_collection, draft).await?;

        let marks = draft.livestock.iter().map(|id| self.set_in_transit(id, true));
        let results = futures::future::join_all(marks).await;

        let mut marked = Vec::new();
        let mut failure = None;
        for (id, result) in draft.livestock.iter().zip(results) {
            match result {
                Ok(_) => marked.push(id.as_str()),
                Err(e) => {
                    warn!("Could not mark {} as in transit: {}", id, e);
                    if failure.is_none() {
                        failure = Some(e);
                    }
                }
            }
        }

        if let Some(error) = failure {
            self.roll_back_dispatch(&record.id, &marked).await;
            return Err(error);
        }

        info!(
            "Created transit record {} covering {:.2} km",
            record.id, record.distance
        );
        Ok(record)
    }

    async fn set_in_transit(&self, id: &str, in_transit: bool) -> Result<LivestockRecord> {
        let flag = json!({ "inTransit": in_transit });
        self.update(&self.livestock_collection, id, &flag).await
    }

    async fn roll_back_dispatch(&self, transit_id: &str, marked: &[&str]) {
        let clears = marked.iter().map(|id| self.set_in_transit(id, false));
        let results = futures::future::join_all(clears).await;
        for (id, result) in marked.iter().zip(results) {
            if let Err(e) = result {
                warn!("Animal {} is still flagged in transit: {}", id, e);
            }
        }

        match self.delete(&self.transit_collection, transit_id).await {
            Ok(()) => info!("Rolled back transit record {}", transit_id),
            Err(e) => warn!("Transit record {} left behind: {}", transit_id, e),
        }
    }

    /// Every stored transit, in the order the store returns them
    pub async fn list_transits(&self) -> Result<Vec<TransitRecord>> {
        self.get_full_list(&self.transit_collection, None).await
    }

    /// Animals that can be added to a new transit
    pub async fn available_livestock(&self) -> Result<Vec<Animal>> {
        let records: Vec<LivestockRecord> = self
            .get_full_list(&self.livestock_collection, Some("inTransit = false"))
            .await?;
        Ok(records.into_iter().map(Animal::from).collect())
    }

    /// Look an animal up by its RFID tag
    pub async fn find_by_tag(&self, tag: &str) -> Result<Option<Animal>> {
        let filter = format!("RFID_Tag=\"{}\"", tag.replace('"', "\\\""));
        let record: Option<LivestockRecord> = self
            .get_first_matching(&self.livestock_collection, &filter)
            .await?;
        Ok(record.map(Animal::from))
    }

    pub async fn fetch_transit(&self, id: &str) -> Result<TransitRecord> {
        self.get_one(&self.transit_collection, id)
            .await?
            .ok_or_else(|| HerdbookError::NotFound(format!("{}/{}", self.transit_collection, id)))
    }
}

#[async_trait]
impl AnimalLookup for PocketBaseClient {
    async fn lookup_animal(&self, id: &str) -> Result<Option<Animal>> {
        let record: Option<LivestockRecord> = self.get_one(&self.livestock_collection, id).await?;
        Ok(record.map(Animal::from))
    }
}

impl FileUrlResolver for PocketBaseClient {
    fn file_url(&self, record_id: &str, filename: &str) -> String {
        self.collection_file_url(&self.livestock_collection, record_id, filename)
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(HerdbookError::Store(format!("{} responded {}: {}", url, status, text)));
    }

    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransitStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// A request as the stub record store received it
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        target: String,
        body: String,
    }

    impl Seen {
        fn is(&self, method: &str, path: &str) -> bool {
            self.method == method && self.target.split('?').next() == Some(path)
        }
    }

    type Handler = dyn Fn(&str, &str, &str) -> (u16, String) + Send + Sync;

    /// Minimal HTTP/1.1 server answering each request through a handler
    struct StubStore {
        base_url: String,
        seen: Arc<Mutex<Vec<Seen>>>,
    }

    impl StubStore {
        async fn start<H>(handler: H) -> Self
        where
            H: Fn(&str, &str, &str) -> (u16, String) + Send + Sync + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base_url = format!("http://{}", listener.local_addr().unwrap());
            let seen = Arc::new(Mutex::new(Vec::new()));
            let handler: Arc<Handler> = Arc::new(handler);

            let log = seen.clone();
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    tokio::spawn(serve(socket, handler.clone(), log.clone()));
                }
            });

            Self { base_url, seen }
        }

        fn client(&self) -> PocketBaseClient {
            PocketBaseClient {
                client: Client::builder().no_proxy().build().unwrap(),
                base_url: self.base_url.clone(),
                livestock_collection: "livestock".to_string(),
                transit_collection: "in_transit".to_string(),
                auth_token: None,
                max_retry_elapsed: Duration::from_secs(3),
            }
        }

        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    async fn serve(mut socket: TcpStream, handler: Arc<Handler>, log: Arc<Mutex<Vec<Seen>>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next().unwrap_or_default().split_whitespace();
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();
        let content_length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

        log.lock().unwrap().push(Seen {
            method: method.clone(),
            target: target.clone(),
            body: body.clone(),
        });

        let (status, payload) = handler(&method, &target, &body);
        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    }

    fn record_id(target: &str) -> &str {
        target.split('?').next().unwrap_or_default().rsplit('/').next().unwrap_or_default()
    }

    fn draft(livestock: &[&str]) -> TransitRecordDraft {
        TransitRecordDraft {
            purpose: "sale".to_string(),
            from: "farm-a".to_string(),
            to: "farm-b".to_string(),
            livestock: livestock.iter().map(|id| id.to_string()).collect(),
            checkpoints: "[]".to_string(),
            status: TransitStatus::Preparing,
            distance: 12.5,
        }
    }

    const TRANSIT_T1: &str = r#"{"id": "t1", "purpose": "sale", "from": "farm-a", "to": "farm-b",
        "livestock": ["cow1", "cow2"], "checkpoints": "[]", "status": "preparing", "distance": 12.5}"#;

    fn test_client() -> PocketBaseClient {
        let settings = StoreSettings {
            base_url: "https://herd.example.org/".to_string(),
            ..StoreSettings::default()
        };
        PocketBaseClient::new(&settings).unwrap()
    }

    #[test]
    fn test_record_urls() {
        let client = test_client();
        assert_eq!(
            client.record_url("livestock", "abc123"),
            "https://herd.example.org/api/collections/livestock/records/abc123"
        );
        assert_eq!(
            client.records_url("in_transit"),
            "https://herd.example.org/api/collections/in_transit/records"
        );
    }

    #[test]
    fn test_file_url_uses_livestock_collection() {
        let client = test_client();
        assert_eq!(
            client.file_url("abc123", "daisy_x1.png"),
            "https://herd.example.org/api/files/livestock/abc123/daisy_x1.png"
        );
    }

    #[test]
    fn test_transient_status_classification() {
        assert!(is_transient_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_status(StatusCode::BAD_GATEWAY));
        assert!(is_transient_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_transient_status(StatusCode::NOT_FOUND));
        assert!(!is_transient_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_list_page_decoding() {
        let json = r#"{
            "page": 1,
            "perPage": 200,
            "totalItems": 2,
            "totalPages": 1,
            "items": [
                {"id": "cow1", "name": "Daisy", "RFID_Tag": "ZW-1", "mother": "", "father": ""},
                {"id": "cow2", "name": "", "RFID_Tag": "ZW-2", "mother": "cow1", "father": ""}
            ]
        }"#;
        let page: ListPage<LivestockRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_pages, 1);

        let animals: Vec<Animal> = page.items.into_iter().map(Animal::from).collect();
        assert_eq!(animals[1].name, None);
        assert_eq!(animals[1].mother_id.as_deref(), Some("cow1"));
    }

    #[tokio::test]
    async fn test_lookup_animal_over_http() {
        let store = StubStore::start(|_, target, _| match record_id(target) {
            "cow1" => (200, r#"{"id": "cow1", "name": "Daisy", "RFID_Tag": "ZW-1", "mother": "cow0", "father": ""}"#.to_string()),
            _ => (404, r#"{"code": 404, "message": "The requested resource wasn't found."}"#.to_string()),
        })
        .await;
        let client = store.client();

        let animal = client.lookup_animal("cow1").await.unwrap().unwrap();
        assert_eq!(animal.name.as_deref(), Some("Daisy"));
        assert_eq!(animal.mother_id.as_deref(), Some("cow0"));
        assert_eq!(animal.father_id, None);

        assert!(client.lookup_animal("ghost").await.unwrap().is_none());
        assert!(store.seen()[0].is("GET", "/api/collections/livestock/records/cow1"));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let store = StubStore::start(move |_, _, _| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                (503, r#"{"message": "busy"}"#.to_string())
            } else {
                (200, r#"{"id": "cow1"}"#.to_string())
            }
        })
        .await;

        let animal = store.client().lookup_animal("cow1").await.unwrap();
        assert_eq!(animal.map(|a| a.id).as_deref(), Some("cow1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let store = StubStore::start(|_, _, _| (400, r#"{"message": "bad filter"}"#.to_string())).await;

        let err = store.client().list_transits().await.unwrap_err();
        assert!(matches!(err, HerdbookError::Store(_)), "Error was: {:?}", err);
        assert_eq!(store.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_available_livestock_walks_every_page() {
        let store = StubStore::start(|_, target, _| {
            if target.contains("page=1&") {
                (200, r#"{"page": 1, "perPage": 200, "totalPages": 2, "items": [{"id": "cow1", "RFID_Tag": "ZW-1"}]}"#.to_string())
            } else {
                (200, r#"{"page": 2, "perPage": 200, "totalPages": 2, "items": [{"id": "cow2", "RFID_Tag": "ZW-2"}]}"#.to_string())
            }
        })
        .await;

        let animals = store.client().available_livestock().await.unwrap();
        let ids: Vec<&str> = animals.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["cow1", "cow2"]);

        let seen = store.seen();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|r| r.target.contains("filter=inTransit+%3D+false")));
        assert!(seen[1].target.contains("page=2"));
    }

    #[tokio::test]
    async fn test_find_by_tag_uses_first_match() {
        let store = StubStore::start(|_, target, _| {
            if target.contains("ZW-7") {
                (200, r#"{"page": 1, "perPage": 1, "totalPages": -1, "items": [{"id": "cow7", "name": "Bella", "RFID_Tag": "ZW-7"}]}"#.to_string())
            } else {
                (200, r#"{"page": 1, "perPage": 1, "totalPages": -1, "items": []}"#.to_string())
            }
        })
        .await;
        let client = store.client();

        let animal = client.find_by_tag("ZW-7").await.unwrap().unwrap();
        assert_eq!(animal.id, "cow7");
        assert!(client.find_by_tag("ZW-8").await.unwrap().is_none());
        assert!(store.seen()[0].target.contains("filter=RFID_Tag%3D%22ZW-7%22"));
    }

    #[tokio::test]
    async fn test_dispatch_creates_record_before_marking_animals() {
        let store = StubStore::start(|method, target, _| match method {
            "POST" => (200, TRANSIT_T1.to_string()),
            _ => (200, format!(r#"{{"id": "{}", "inTransit": true}}"#, record_id(target))),
        })
        .await;

        let record = store.client().dispatch_transit(&draft(&["cow1", "cow2"])).await.unwrap();
        assert_eq!(record.id, "t1");

        let seen = store.seen();
        assert_eq!(seen.len(), 3);
        assert!(seen[0].is("POST", "/api/collections/in_transit/records"));
        assert!(seen[0].body.contains(r#""status":"preparing""#));
        for id in ["cow1", "cow2"] {
            let path = format!("/api/collections/livestock/records/{}", id);
            let patch = seen.iter().find(|r| r.is("PATCH", &path)).unwrap();
            assert_eq!(patch.body, r#"{"inTransit":true}"#);
        }
    }

    #[tokio::test]
    async fn test_failed_create_marks_no_animals() {
        let store = StubStore::start(|_, _, _| (400, r#"{"message": "Failed to create record."}"#.to_string())).await;

        let err = store.client().dispatch_transit(&draft(&["cow1"])).await.unwrap_err();
        assert!(matches!(err, HerdbookError::Store(_)));

        let seen = store.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, "POST");
    }

    #[tokio::test]
    async fn test_failed_mark_rolls_dispatch_back() {
        let store = StubStore::start(|method, target, _| match (method, record_id(target)) {
            ("POST", _) => (200, TRANSIT_T1.to_string()),
            ("PATCH", "cow2") => (400, r#"{"message": "Failed to update record."}"#.to_string()),
            ("PATCH", id) => (200, format!(r#"{{"id": "{}"}}"#, id)),
            ("DELETE", _) => (204, String::new()),
            _ => (404, "{}".to_string()),
        })
        .await;

        let err = store.client().dispatch_transit(&draft(&["cow1", "cow2"])).await.unwrap_err();
        assert!(matches!(err, HerdbookError::Store(_)), "Error was: {:?}", err);

        let seen = store.seen();
        assert!(seen[0].is("POST", "/api/collections/in_transit/records"));

        let cleared: Vec<&Seen> = seen
            .iter()
            .filter(|r| r.method == "PATCH" && r.body == r#"{"inTransit":false}"#)
            .collect();
        assert_eq!(cleared.len(), 1);
        assert_eq!(record_id(&cleared[0].target), "cow1");

        let last = seen.last().unwrap();
        assert!(last.is("DELETE", "/api/collections/in_transit/records/t1"));
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_delete_treats_missing_record_as_deleted() {
        let store = StubStore::start(|_, target, _| match record_id(target) {
            "gone" => (404, "{}".to_string()),
            _ => (403, r#"{"message": "Only admins can perform this action."}"#.to_string()),
        })
        .await;
        let client = store.client();

        assert!(client.delete("in_transit", "gone").await.is_ok());
        assert!(client.delete("in_transit", "locked").await.is_err());
    }
}
