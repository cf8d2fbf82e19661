use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::config::AppConfig;
use crate::entries::{EntryDraft, JournalEntry};
use crate::search::{self, SearchOptions, TagFrequency};
use crate::storage::{parse_entries, serialize_entries};
use crate::store::JournalStore;
use crate::tags::tags_from_string;

const SNIPPET_MAX_CHARS: usize = 160;

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Title for the entry (prompted if omitted, blank falls back to a placeholder)
    #[arg()]
    pub title: Option<String>,
    /// Provide the entry content inline. If omitted, reads from stdin.
    #[arg(long)]
    pub content: Option<String>,
    /// Comma-separated tags, e.g. --tags "travel, food"
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    /// Identifier of the entry to rewrite
    pub id: String,
    /// Replacement title (current title kept if omitted)
    #[arg(long)]
    pub title: Option<String>,
    /// Replacement content (current content kept if omitted)
    #[arg(long)]
    pub content: Option<String>,
    /// Replacement comma-separated tags (current tags kept if omitted)
    #[arg(long)]
    pub tags: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// Identifier of the entry to delete
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Identifier of the entry to print
    pub id: String,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only list entries carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Limit the number of entries printed (overrides search.max_results)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Text matched against titles and content
    #[arg()]
    pub query: Vec<String>,
    /// Only match entries carrying this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Limit the number of results printed
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON file holding an exported entry array or envelope
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Destination file (defaults to journal-entries-<timestamp>.json)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ClearArgs {
    /// Confirm deleting every entry
    #[arg(long)]
    pub yes: bool,
}

pub fn add_entry(store: &mut JournalStore, args: AddArgs) -> Result<()> {
    let title = match args.title {
        Some(title) => title,
        None => prompt("Title")?,
    };
    let content = if let Some(content) = args.content {
        content
    } else {
        read_stdin()?.unwrap_or_default()
    };
    let tags = args
        .tags
        .map(|raw| tags_from_string(&raw))
        .unwrap_or_default();

    let entry = store.create_entry(&EntryDraft {
        title,
        content,
        tags,
    });
    println!("Created entry {} ({})", entry.id, entry.title);
    Ok(())
}

pub fn edit_entry(store: &mut JournalStore, args: EditArgs) -> Result<()> {
    let Some(current) = store.entry_by_id(&args.id).cloned() else {
        bail!("entry {} not found", args.id);
    };

    let draft = EntryDraft {
        title: args.title.unwrap_or(current.title),
        content: args.content.unwrap_or(current.content),
        tags: args
            .tags
            .map(|raw| tags_from_string(&raw))
            .unwrap_or(current.tags),
    };

    match store.update_entry(&args.id, &draft) {
        Some(updated) => {
            println!("Updated entry {} ({})", updated.id, updated.title);
            Ok(())
        }
        None => bail!("entry {} not found", args.id),
    }
}

pub fn delete_entry(store: &mut JournalStore, args: DeleteArgs) -> Result<()> {
    let Some(entry) = store.entry_by_id(&args.id) else {
        bail!("entry {} not found", args.id);
    };
    let title = entry.title.clone();
    store.delete_entry(&args.id);
    println!("Deleted entry {} ({})", args.id, title);
    Ok(())
}

pub fn show_entry(store: &JournalStore, args: ShowArgs) -> Result<()> {
    let Some(entry) = store.entry_by_id(&args.id) else {
        bail!("entry {} not found", args.id);
    };
    print!("{}", format_entry(entry));
    Ok(())
}

pub fn list_entries(config: &AppConfig, store: &JournalStore, args: ListArgs) -> Result<()> {
    if store.entries().is_empty() {
        println!("No journal entries yet. Use `retrolog add` to write the first one.");
        return Ok(());
    }
    let options = SearchOptions {
        query: None,
        tag: args.tag,
    };
    let results = search::search_entries(store.entries(), &options);
    let limit = effective_limit(args.limit, config);
    print!(
        "{}",
        format_entry_list(&results, limit, usize::from(config.preview_lines))
    );
    Ok(())
}

pub fn search_entries(config: &AppConfig, store: &JournalStore, args: SearchArgs) -> Result<()> {
    let query = args.query.join(" ");
    let options = SearchOptions {
        query: if query.trim().is_empty() {
            None
        } else {
            Some(query)
        },
        tag: args.tag,
    };
    if options.is_empty() {
        bail!("search needs a query or --tag filter");
    }

    let results = search::search_entries(store.entries(), &options);
    let limit = effective_limit(args.limit, config);
    print!(
        "{}",
        format_entry_list(&results, limit, usize::from(config.preview_lines))
    );
    Ok(())
}

pub fn tag_summary(store: &JournalStore) -> Result<()> {
    let frequencies = search::tag_frequencies(store.entries());
    print!("{}", format_tag_summary(&frequencies));
    Ok(())
}

pub fn import_entries(store: &mut JournalStore, args: ImportArgs) -> Result<()> {
    let payload = fs::read_to_string(&args.file)
        .with_context(|| format!("reading import file {}", args.file.display()))?;
    let imported = parse_entries(&payload);
    if imported.is_empty() {
        println!("No journal entries found in {}.", args.file.display());
        return Ok(());
    }

    store.import_entries(&imported);
    println!(
        "Imported {} {}!",
        imported.len(),
        if imported.len() == 1 { "entry" } else { "entries" }
    );
    Ok(())
}

pub fn export_entries(store: &JournalStore, args: ExportArgs) -> Result<()> {
    if store.entries().is_empty() {
        println!("No journal entries to export yet.");
        return Ok(());
    }

    let payload = serialize_entries(store.entries()).context("serialising journal entries")?;
    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_export_name()));
    fs::write(&path, payload)
        .with_context(|| format!("writing export file {}", path.display()))?;
    println!(
        "Exported {} {} to {}",
        store.entries().len(),
        if store.entries().len() == 1 { "entry" } else { "entries" },
        path.display()
    );
    Ok(())
}

pub fn clear_entries(store: &mut JournalStore, args: ClearArgs) -> Result<()> {
    if !args.yes {
        bail!("refusing to clear the journal without --yes");
    }
    let count = store.entries().len();
    store.clear();
    println!(
        "Cleared {} {}.",
        count,
        if count == 1 { "entry" } else { "entries" }
    );
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    use std::io::Write;
    let mut stdout = io::stdout();
    write!(stdout, "{}: ", label)?;
    stdout.flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim_end().to_owned())
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

fn effective_limit(requested: Option<usize>, config: &AppConfig) -> usize {
    let limit = requested.unwrap_or(config.search.max_results);
    if limit == 0 {
        usize::MAX
    } else {
        limit
    }
}

fn format_entry(entry: &JournalEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "{}", entry.title);
    let _ = writeln!(&mut out, "id      {}", entry.id);
    let _ = writeln!(&mut out, "created {}", format_timestamp(entry.created_at));
    let _ = writeln!(&mut out, "updated {}", format_timestamp(entry.updated_at));
    if !entry.tags.is_empty() {
        let _ = writeln!(&mut out, "tags    {}", format_tags(&entry.tags));
    }
    if !entry.content.is_empty() {
        out.push('\n');
        out.push_str(&entry.content);
        if !entry.content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

fn format_entry_list(entries: &[JournalEntry], limit: usize, preview_lines: usize) -> String {
    if entries.is_empty() {
        return "No matches found.\n".to_string();
    }
    let mut out = String::new();
    for entry in entries.iter().take(limit) {
        let _ = writeln!(&mut out, "{}  {}", entry.id, entry.title);
        let _ = writeln!(&mut out, "    updated {}", format_timestamp(entry.updated_at));
        if !entry.tags.is_empty() {
            let _ = writeln!(&mut out, "    tags    {}", format_tags(&entry.tags));
        }
        if let Some(snippet) = build_snippet(&entry.content, preview_lines) {
            let _ = writeln!(&mut out, "    {snippet}");
        }
        out.push('\n');
    }
    if entries.len() > limit {
        let _ = writeln!(&mut out, "({} more not shown)", entries.len() - limit);
    }
    out
}

fn format_tag_summary(frequencies: &[TagFrequency]) -> String {
    if frequencies.is_empty() {
        return "(no tags)\n".to_string();
    }
    let mut out = String::new();
    for frequency in frequencies {
        let _ = writeln!(&mut out, "#{}  {}", frequency.tag, frequency.count);
    }
    out
}

fn build_snippet(content: &str, preview_lines: usize) -> Option<String> {
    if preview_lines == 0 {
        return None;
    }
    let mut segments = Vec::new();
    for line in content.lines().take(preview_lines) {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            segments.push(trimmed.to_string());
        }
    }
    if segments.is_empty() {
        None
    } else {
        let snippet = segments.join(" ");
        let truncated = snippet.chars().take(SNIPPET_MAX_CHARS).collect::<String>();
        Some(truncated)
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{}", tag))
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_timestamp(epoch_ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(epoch_ms) * 1_000_000)
        .map(|dt| dt.format(&Rfc3339).unwrap_or_else(|_| epoch_ms.to_string()))
        .unwrap_or_else(|_| epoch_ms.to_string())
}

fn default_export_name() -> String {
    let now = OffsetDateTime::now_utc();
    let timestamp = now
        .format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("journal-entries-{timestamp}.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    type TestResult<T = ()> = Result<T>;

    fn seeded_store(titles: &[&str]) -> JournalStore {
        let mut store = JournalStore::detached(Vec::new());
        for title in titles {
            store.create_entry(&EntryDraft {
                title: title.to_string(),
                content: String::new(),
                tags: Vec::new(),
            });
        }
        store
    }

    #[test]
    fn cli_add_normalizes_title_and_tags() -> TestResult {
        let mut store = JournalStore::detached(Vec::new());
        add_entry(
            &mut store,
            AddArgs {
                title: Some("  Neon Nights  ".into()),
                content: Some("Synth haze".into()),
                tags: Some("retro,  retro , wave".into()),
            },
        )?;

        assert_eq!(store.entries().len(), 1);
        let entry = &store.entries()[0];
        assert_eq!(entry.title, "Neon Nights");
        assert_eq!(entry.tags, vec!["retro", "wave"]);
        Ok(())
    }

    #[test]
    fn cli_add_accepts_blank_title() -> TestResult {
        let mut store = JournalStore::detached(Vec::new());
        add_entry(
            &mut store,
            AddArgs {
                title: Some("   ".into()),
                content: Some("body".into()),
                tags: None,
            },
        )?;
        assert_eq!(store.entries()[0].title, "Untitled Entry");
        Ok(())
    }

    #[test]
    fn cli_edit_keeps_omitted_fields() -> TestResult {
        let mut store = JournalStore::detached(Vec::new());
        let created = store.create_entry(&EntryDraft {
            title: "Original".into(),
            content: "Original body".into(),
            tags: vec!["keep".into()],
        });

        edit_entry(
            &mut store,
            EditArgs {
                id: created.id.clone(),
                title: Some("Renamed".into()),
                content: None,
                tags: None,
            },
        )?;

        let entry = store.entry_by_id(&created.id).expect("entry present");
        assert_eq!(entry.title, "Renamed");
        assert_eq!(entry.content, "Original body");
        assert_eq!(entry.tags, vec!["keep"]);
        assert!(entry.updated_at > created.updated_at);
        Ok(())
    }

    #[test]
    fn cli_edit_unknown_id_fails() {
        let mut store = seeded_store(&["Solo"]);
        let err = edit_entry(
            &mut store,
            EditArgs {
                id: "missing".into(),
                title: Some("x".into()),
                content: None,
                tags: None,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn cli_delete_removes_entry_and_rejects_unknown_ids() -> TestResult {
        let mut store = seeded_store(&["Doomed"]);
        let id = store.entries()[0].id.clone();

        delete_entry(&mut store, DeleteArgs { id: id.clone() })?;
        assert!(store.entries().is_empty());

        let err = delete_entry(&mut store, DeleteArgs { id }).unwrap_err();
        assert!(err.to_string().contains("not found"));
        Ok(())
    }

    #[test]
    fn cli_search_requires_query_or_tag() {
        let store = seeded_store(&["Solo"]);
        let err = search_entries(
            &AppConfig::default(),
            &store,
            SearchArgs {
                query: vec!["   ".into()],
                tag: None,
                limit: None,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("query or --tag"));
    }

    #[test]
    fn empty_results_render_a_notice() {
        assert_eq!(format_entry_list(&[], 5, 2), "No matches found.\n");
    }

    #[test]
    fn list_formatting_caps_results_and_reports_overflow() {
        let store = seeded_store(&["One", "Two", "Three"]);
        let output = format_entry_list(store.entries(), 2, 0);
        assert_eq!(output.matches("updated").count(), 2);
        assert!(output.contains("(1 more not shown)"));
    }

    #[test]
    fn entry_formatting_includes_tags_and_content() {
        let mut store = JournalStore::detached(Vec::new());
        let created = store.create_entry(&EntryDraft {
            title: "Full".into(),
            content: "Line one\nLine two".into(),
            tags: vec!["alpha".into(), "beta".into()],
        });

        let output = format_entry(store.entry_by_id(&created.id).expect("entry present"));
        assert!(output.starts_with("Full\n"));
        assert!(output.contains("tags    #alpha #beta"));
        assert!(output.ends_with("Line one\nLine two\n"));
    }

    #[test]
    fn tag_summary_formatting_lists_counted_tags() {
        let mut store = JournalStore::detached(Vec::new());
        store.create_entry(&EntryDraft {
            title: "One".into(),
            content: String::new(),
            tags: vec!["retro".into(), "wave".into()],
        });
        store.create_entry(&EntryDraft {
            title: "Two".into(),
            content: String::new(),
            tags: vec!["retro".into()],
        });

        let summary = format_tag_summary(&search::tag_frequencies(store.entries()));
        assert_eq!(summary, "#retro  2\n#wave  1\n");
    }

    #[test]
    fn tag_summary_formatting_notes_a_tagless_journal() {
        assert_eq!(format_tag_summary(&[]), "(no tags)\n");
    }

    #[test]
    fn snippets_collapse_lines_and_truncate() {
        let long_line = "x".repeat(200);
        let content = format!("  first  \n\n{long_line}");
        let snippet = build_snippet(&content, 3).expect("snippet present");
        assert!(snippet.starts_with("first"));
        assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS);

        assert!(build_snippet("\n\n", 2).is_none());
        assert!(build_snippet("text", 0).is_none());
    }

    #[test]
    fn cli_import_merges_file_contents() -> TestResult {
        let temp = TempDir::new()?;
        let mut store = seeded_store(&["Local"]);
        let mut incoming = store.entries()[0].clone();
        incoming.title = "Imported".into();
        incoming.updated_at += 1;

        let file = temp.path().join("export.json");
        fs::write(&file, serde_json::to_vec(&vec![incoming])?)?;

        import_entries(&mut store, ImportArgs { file })?;
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].title, "Imported");
        Ok(())
    }

    #[test]
    fn cli_import_of_empty_payload_changes_nothing() -> TestResult {
        let temp = TempDir::new()?;
        let file = temp.path().join("empty.json");
        fs::write(&file, "[]")?;

        let mut store = seeded_store(&["Local"]);
        import_entries(&mut store, ImportArgs { file })?;
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].title, "Local");
        Ok(())
    }

    #[test]
    fn cli_export_round_trips_through_import() -> TestResult {
        let temp = TempDir::new()?;
        let store = seeded_store(&["Kept"]);
        let output = temp.path().join("out.json");

        export_entries(
            &store,
            ExportArgs {
                output: Some(output.clone()),
            },
        )?;

        let mut restored = JournalStore::detached(Vec::new());
        import_entries(&mut restored, ImportArgs { file: output })?;
        assert_eq!(restored.entries(), store.entries());
        Ok(())
    }

    #[test]
    fn cli_export_skips_empty_journal() -> TestResult {
        let temp = TempDir::new()?;
        let output = temp.path().join("out.json");
        export_entries(
            &JournalStore::detached(Vec::new()),
            ExportArgs {
                output: Some(output.clone()),
            },
        )?;
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn cli_clear_requires_confirmation() -> TestResult {
        let mut store = seeded_store(&["Precious"]);
        assert!(clear_entries(&mut store, ClearArgs { yes: false }).is_err());
        assert_eq!(store.entries().len(), 1);

        clear_entries(&mut store, ClearArgs { yes: true })?;
        assert!(store.entries().is_empty());
        Ok(())
    }

    #[test]
    fn default_export_name_embeds_a_timestamp() {
        let name = default_export_name();
        assert!(name.starts_with("journal-entries-"));
        assert!(name.ends_with(".json"));
    }
}
