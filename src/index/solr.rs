use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::query::{Page, SearchQuery};
use super::{fields, IndexFuture, SearchIndex};
use crate::entries::Entry;
use crate::languages::PartOfSpeech;

/// One core of a multicore Solr server.
#[derive(Debug, Clone)]
pub struct SolrIndex {
    client: reqwest::Client,
    core_url: String,
    core: String,
}

impl SolrIndex {
    pub fn new(client: reqwest::Client, base_url: &str, core: impl Into<String>) -> Self {
        let core = core.into();
        let core_url = format!("{}/{}", base_url.trim_end_matches('/'), core);
        Self {
            client,
            core_url,
            core,
        }
    }

    /// One index per configured core, sharing a single HTTP client.
    pub fn for_directions(base_url: &str, directions: &[String]) -> Vec<Arc<dyn SearchIndex>> {
        let client = reqwest::Client::new();
        directions
            .iter()
            .map(|core| {
                Arc::new(SolrIndex::new(client.clone(), base_url, core.clone()))
                    as Arc<dyn SearchIndex>
            })
            .collect()
    }

    async fn select(&self, query: &SearchQuery) -> Result<Page<Entry>> {
        let q = query.to_query_string();
        let start = query.page.offset().to_string();
        let rows = query.page.size.to_string();
        let response = self
            .client
            .get(format!("{}/select", self.core_url))
            .query(&[
                ("q", q.as_str()),
                ("start", start.as_str()),
                ("rows", rows.as_str()),
                ("wt", "json"),
            ])
            .send()
            .await
            .with_context(|| format!("failed to query core '{}'", self.core))?;
        let body = read_body(response, &self.core).await?;
        let parsed: SelectResponse = serde_json::from_str(&body)
            .with_context(|| format!("unexpected select response from core '{}'", self.core))?;
        let content = parsed
            .response
            .docs
            .iter()
            .map(document_to_entry)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, query.page, parsed.response.num_found))
    }

    async fn fetch(&self, id: &str) -> Result<Option<Entry>> {
        let response = self
            .client
            .get(format!("{}/get", self.core_url))
            .query(&[("id", id), ("wt", "json")])
            .send()
            .await
            .with_context(|| format!("failed to fetch {} from core '{}'", id, self.core))?;
        let body = read_body(response, &self.core).await?;
        let parsed: GetResponse = serde_json::from_str(&body)
            .with_context(|| format!("unexpected get response from core '{}'", self.core))?;
        parsed.doc.as_ref().map(document_to_entry).transpose()
    }

    async fn update(&self, body: Value, commit: bool) -> Result<()> {
        let mut params = vec![("wt", "json")];
        if commit {
            params.push(("commit", "true"));
        }
        let response = self
            .client
            .post(format!("{}/update", self.core_url))
            .query(&params)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to update core '{}'", self.core))?;
        read_body(response, &self.core).await?;
        Ok(())
    }
}

impl SearchIndex for SolrIndex {
    fn name(&self) -> &str {
        &self.core
    }

    fn query<'a>(&'a self, query: &'a SearchQuery) -> IndexFuture<'a, Page<Entry>> {
        Box::pin(self.select(query))
    }

    fn get_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, Option<Entry>> {
        Box::pin(self.fetch(id))
    }

    fn save<'a>(&'a self, entry: &'a Entry) -> IndexFuture<'a, ()> {
        Box::pin(async move {
            let document = entry_to_document(entry)?;
            self.update(json!([document]), false).await
        })
    }

    fn delete_by_id<'a>(&'a self, id: &'a str) -> IndexFuture<'a, ()> {
        Box::pin(self.update(json!({"delete": {"id": id}}), false))
    }

    fn commit(&self) -> IndexFuture<'_, ()> {
        Box::pin(self.update(json!({}), true))
    }
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectBody,
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    doc: Option<Map<String, Value>>,
}

async fn read_body(response: reqwest::Response, core: &str) -> Result<String> {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    if status.is_success() {
        return Ok(text);
    }
    Err(anyhow!(
        "Solr core '{}' error ({}): {}",
        core,
        status,
        extract_solr_error(&text).unwrap_or(text)
    ))
}

fn extract_solr_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("msg")?
        .as_str()
        .map(str::to_string)
}

/// Stored document for an entry. The id is left out when absent so Solr
/// assigns one.
fn entry_to_document(entry: &Entry) -> Result<Map<String, Value>> {
    let mut document = Map::new();
    let mut put = |name: &str, value: Option<&str>| {
        if let Some(value) = value {
            document.insert(name.to_string(), Value::String(value.to_string()));
        }
    };
    put(fields::ID, entry.id.as_deref());
    put(fields::SOURCE_PHRASE, Some(entry.source_phrase.as_str()));
    put(fields::TARGET_PHRASE, Some(entry.target_phrase.as_str()));
    put(
        fields::PART_OF_SPEECH,
        entry.part_of_speech.as_ref().map(PartOfSpeech::as_str),
    );
    put(fields::DICTIONARY, entry.dictionary.as_deref());
    put(fields::AUTHOR, entry.author.as_deref());
    put(fields::COMMENTARY, Some(entry.commentary.as_str()));
    put(fields::IMAGE, entry.image_name.as_deref());
    put(fields::PRONUNCIATION, entry.pronunciation.as_deref());
    if let Some(date) = entry.date {
        let formatted = date
            .format(&Rfc3339)
            .with_context(|| "failed to format entry date")?;
        document.insert(fields::DATE.to_string(), Value::String(formatted));
    }
    Ok(document)
}

fn document_to_entry(document: &Map<String, Value>) -> Result<Entry> {
    let date = text_field(document, fields::DATE)
        .map(|raw| {
            OffsetDateTime::parse(&raw, &Rfc3339)
                .with_context(|| format!("invalid date in stored entry: {}", raw))
        })
        .transpose()?;
    Ok(Entry {
        id: text_field(document, fields::ID),
        source_phrase: text_field(document, fields::SOURCE_PHRASE).unwrap_or_default(),
        part_of_speech: text_field(document, fields::PART_OF_SPEECH)
            .and_then(|name| PartOfSpeech::from_name(&name.replace('_', "-"))),
        target_phrase: text_field(document, fields::TARGET_PHRASE).unwrap_or_default(),
        dictionary: text_field(document, fields::DICTIONARY),
        author: text_field(document, fields::AUTHOR),
        commentary: text_field(document, fields::COMMENTARY).unwrap_or_default(),
        image_name: text_field(document, fields::IMAGE),
        date,
        pronunciation: text_field(document, fields::PRONUNCIATION),
    })
}

/// Single-valued or multi-valued (first value wins) text field.
fn text_field(document: &Map<String, Value>, name: &str) -> Option<String> {
    let value = match document.get(name)? {
        Value::Array(values) => values.first()?,
        other => other,
    };
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
