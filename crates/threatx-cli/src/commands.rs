//! Subcommand bodies. Results go to stdout as JSON lines; logs go to stderr.

use anyhow::{Context as _, bail};
use serde_json::{Value, json};
use threatx_client::{MutationResult, QueryOptions, ThreatExchangeClient, WriteOptions};
use threatx_core::{
  descriptor::Descriptor,
  post_param::PostParams,
  validate::MutationKind,
  window::CreatedWindow,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Everything a subcommand needs besides its own arguments.
pub struct Session {
  pub client:  ThreatExchangeClient,
  pub query:   QueryOptions,
  pub created: CreatedWindow,
}

// ─── Reads ────────────────────────────────────────────────────────────────────

pub async fn tag_to_ids(cx: &Session, tag: &str) -> anyhow::Result<()> {
  let tag_id = resolve_tag(cx, tag).await?;
  cx.client
    .process_descriptor_ids_by_tag_id(&tag_id, &cx.query, |ids| {
      for id in ids {
        println!("{id}");
      }
    })
    .await
    .with_context(|| format!("listing objects tagged {tag}"))
}

pub async fn ids_to_details(cx: &Session, ids: Vec<String>) -> anyhow::Result<()> {
  let ids = if ids.is_empty() { read_stdin_lines().await? } else { ids };
  let batch = cx.query.page_size.max(1) as usize;
  for chunk in ids.chunks(batch) {
    let descriptors = cx
      .client
      .get_info_for_ids(chunk, &cx.query)
      .await
      .context("fetching descriptor details")?;
    print_descriptors(&cx.created, &descriptors)?;
  }
  Ok(())
}

pub async fn tag_to_details(cx: &Session, tag: &str) -> anyhow::Result<()> {
  let tag_id = resolve_tag(cx, tag).await?;
  let mut pages = cx.client.tagged_objects(&tag_id, &cx.query)?;
  while let Some(page) = pages
    .next_page()
    .await
    .with_context(|| format!("listing objects tagged {tag}"))?
  {
    let ids = ThreatExchangeClient::descriptor_ids(page, &cx.query)?;
    if ids.is_empty() {
      continue;
    }
    let descriptors = cx
      .client
      .get_info_for_ids(&ids, &cx.query)
      .await
      .context("fetching descriptor details")?;
    print_descriptors(&cx.created, &descriptors)?;
  }
  Ok(())
}

pub async fn search(cx: &Session, params: &[(String, String)]) -> anyhow::Result<()> {
  let mut printed = Ok(());
  cx.client
    .power_search(params, &cx.query, |page| {
      if printed.is_ok() {
        printed = print_descriptors(&cx.created, &page);
      }
    })
    .await
    .context("searching descriptors")?;
  printed
}

async fn resolve_tag(cx: &Session, tag: &str) -> anyhow::Result<String> {
  match cx.client.get_tag_id_from_name(tag, cx.query.show_urls).await? {
    Some(id) => {
      if cx.query.verbose {
        info!(tag, tag_id = %id, "resolved tag");
      }
      Ok(id)
    }
    None => bail!("tag \"{tag}\" not found"),
  }
}

fn print_descriptors(
  window: &CreatedWindow,
  descriptors: &[Descriptor],
) -> anyhow::Result<()> {
  for descriptor in descriptors.iter().filter(|d| window.contains(d)) {
    println!("{}", serde_json::to_string(descriptor)?);
  }
  Ok(())
}

// ─── Writes ───────────────────────────────────────────────────────────────────

/// Run one mutation from `fields`, or one per JSON-object line on stdin.
///
/// Every result is printed; the command fails at the end if any did.
pub async fn mutate(
  cx: &Session,
  kind: MutationKind,
  fields: &[String],
  from_stdin: bool,
  opts: WriteOptions,
) -> anyhow::Result<()> {
  let mut batch = Vec::new();
  if from_stdin {
    for (line_no, line) in read_stdin_lines().await?.into_iter().enumerate() {
      batch.push(parse_json_line(&line).with_context(|| {
        format!("stdin line {}: expected a JSON object of post fields", line_no + 1)
      }));
    }
  } else {
    batch.push(parse_fields(fields));
  }

  let total = batch.len();
  let mut failed = 0;
  for params in batch {
    let line = match params {
      Ok(params) => {
        let result = cx.client.mutate(kind, &params, opts).await;
        if !result.is_ok() {
          failed += 1;
        }
        result_json(&result)
      }
      Err(e) => {
        warn!("{e:#}");
        failed += 1;
        json!({ "ok": false, "input_error": format!("{e:#}") })
      }
    };
    println!("{line}");
  }

  if failed > 0 {
    bail!("{failed} of {total} {kind} requests failed");
  }
  Ok(())
}

fn parse_fields(fields: &[String]) -> anyhow::Result<PostParams> {
  fields
    .iter()
    .map(|field| PostParams::parse_assignment(field).map_err(anyhow::Error::from))
    .collect()
}

fn parse_json_line(line: &str) -> anyhow::Result<PostParams> {
  let Value::Object(object) = serde_json::from_str::<Value>(line)? else {
    bail!("not a JSON object");
  };
  Ok(PostParams::from_json_object(&object)?)
}

fn result_json(result: &MutationResult) -> Value {
  let mut line = json!({ "ok": result.is_ok() });
  if let Some(e) = &result.validation_error {
    line["validation_error"] = json!(e.to_string());
  }
  if let Some(e) = &result.transport_error {
    line["transport_error"] = json!(e.to_string());
  }
  if let Some(body) = &result.body {
    line["response"] = body.clone();
  }
  line
}

async fn read_stdin_lines() -> anyhow::Result<Vec<String>> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut out = Vec::new();
  while let Some(line) = lines.next_line().await.context("reading stdin")? {
    let line = line.trim();
    if !line.is_empty() {
      out.push(line.to_string());
    }
  }
  Ok(out)
}
