use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::{Category, RootPaths, Settings};
use crate::error::PipelineError;
use crate::utils::write_atomic;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const PAGE_EXTENSION: &str = ".html";
const GENERATED_PRIORITY: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Never => "never",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

pub struct SitemapSummary {
    pub total: usize,
    pub main: usize,
    pub content: usize,
    pub legal: usize,
    pub date: NaiveDate,
}

impl SitemapSummary {
    fn of(entries: &[SitemapEntry], date: NaiveDate) -> Self {
        let count = |f: &dyn Fn(f32) -> bool| entries.iter().filter(|e| f(e.priority)).count();
        Self {
            total: entries.len(),
            main: count(&|p| p >= 0.6),
            content: count(&|p| (0.4..0.6).contains(&p)),
            legal: count(&|p| p < 0.4),
            date,
        }
    }

    pub fn print(&self) {
        println!("Sitemap summary:");
        println!("  Total pages:   {}", self.total);
        println!("  Main pages:    {}", self.main);
        println!("  Content pages: {}", self.content);
        println!("  Legal pages:   {}", self.legal);
        println!("  Last updated:  {}", self.date.format("%Y-%m-%d"));
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Curated pages first, then every generated page found on disk.
pub fn collect_entries(
    settings: &Settings,
    paths: &RootPaths,
    categories: &[Category],
    date: NaiveDate,
) -> Result<Vec<SitemapEntry>> {
    let mut entries: Vec<SitemapEntry> = settings
        .curated
        .iter()
        .map(|page| SitemapEntry {
            loc: join_url(&settings.base_url, &page.path),
            lastmod: date,
            changefreq: page.changefreq,
            priority: page.priority,
        })
        .collect();

    for category in categories {
        let dir = paths.category_pages(category);
        let Some(files) = generated_pages(&dir)? else {
            debug!("No generated pages for {} at {}", category, dir.display());
            continue;
        };
        let prefix = format!(
            "{}/{}",
            settings.pages_url_path.trim_end_matches('/'),
            category.pages_dir_name()
        );
        entries.extend(files.into_iter().map(|file| SitemapEntry {
            loc: join_url(&settings.base_url, &format!("{}/{}", prefix, file)),
            lastmod: date,
            changefreq: ChangeFreq::Monthly,
            priority: GENERATED_PRIORITY,
        }));
    }

    Ok(entries)
}

/// Sorted page file names in `dir`, or `None` when it was never generated.
fn generated_pages(dir: &Path) -> Result<Option<Vec<String>>, PipelineError> {
    let read_err = |e: io::Error| PipelineError::configuration(dir, format!("cannot read: {}", e));
    let listing = match fs::read_dir(dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_err(e)),
    };

    let mut files = Vec::new();
    for entry in listing {
        let entry = entry.map_err(read_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(PAGE_EXTENSION) && entry.file_type().map_err(read_err)?.is_file() {
            files.push(name);
        }
    }
    files.sort();
    Ok(Some(files))
}

fn text_element<W: io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub fn render_xml(entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        text_element(&mut writer, "loc", &entry.loc)?;
        text_element(&mut writer, "lastmod", &entry.lastmod.format("%Y-%m-%d").to_string())?;
        text_element(&mut writer, "changefreq", entry.changefreq.as_str())?;
        text_element(&mut writer, "priority", &format_priority(entry.priority))?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    let mut xml = String::from_utf8(writer.into_inner())?;
    xml.push('\n');
    Ok(xml)
}

pub fn render_url_list(entries: &[SitemapEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}\n", e.loc))
        .collect()
}

/// Rebuild sitemap.xml and urls.txt from the curated table and the page tree.
pub fn build(
    settings: &Settings,
    paths: &RootPaths,
    categories: &[Category],
    date: NaiveDate,
) -> Result<SitemapSummary> {
    let entries = collect_entries(settings, paths, categories, date)?;

    write_atomic(&paths.sitemap, render_xml(&entries)?.as_bytes())?;
    info!("Wrote {} URLs to {}", entries.len(), paths.sitemap.display());
    write_atomic(&paths.urls, render_url_list(&entries).as_bytes())?;
    info!("Wrote {} URLs to {}", entries.len(), paths.urls.display());

    Ok(SitemapSummary::of(&entries, date))
}

/// Shortest decimal form of a priority, always with a fractional part.
fn format_priority(priority: f32) -> String {
    let s = priority.to_string();
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Number of URLs in an existing sitemap; zero when none was built yet.
pub fn count_urls(path: &Path) -> Result<usize> {
    let xml = match fs::read_to_string(path) {
        Ok(xml) => xml,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("Failed to read {}", path.display())))
        }
    };
    let urls = parse_urlset(&xml).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(urls.len())
}

/// Parse a urlset XML and return all <loc> URLs.
pub fn parse_urlset(xml: &str) -> Result<Vec<String>> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut urls = Vec::new();
    let mut in_url = false;
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"url" => in_url = true,
                b"loc" if in_url => in_loc = true,
                _ => {}
            },
            Ok(Event::Text(e)) if in_loc => {
                urls.push(e.unescape()?.to_string());
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"loc" => in_loc = false,
                b"url" => in_url = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {}
        }
        buf.clear();
    }
    Ok(urls)
}
