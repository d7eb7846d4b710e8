pub mod template;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{Category, RootPaths};
use crate::error::{PipelineError, Result};
use crate::slug::slugify;
use crate::store::ContentStore;
use template::IndexLink;

pub const INDEX_FILE: &str = "index.html";

pub struct GenerateStats {
    pub category: Category,
    pub written: usize,
    pub skipped: usize,
    pub out_dir: PathBuf,
}

/// Rebuild `<pages_dir>/<category>-auto` from the category's store.
///
/// Pages are rendered into a staging directory that replaces the live one
/// only once every page is on disk, so pages of removed entities disappear
/// and a failed run leaves the previous tree in place. Entities whose slugs
/// collide overwrite each other in store order.
pub fn generate_category(
    store: &ContentStore,
    paths: &RootPaths,
    category: &Category,
    site_name: &str,
) -> Result<GenerateStats> {
    let entities = store.read(category)?;
    let out_dir = paths.category_pages(category);
    let staging = paths
        .pages_dir
        .join(format!(".{}.staging", category.pages_dir_name()));

    reset_dir(&staging)?;

    let title_suffix = format!("{} {}", site_name, category.singular());
    let mut links = Vec::with_capacity(entities.len());
    let mut skipped = 0;

    for entity in &entities {
        let slug = slugify(&entity.name);
        if slug.is_empty() {
            warn!("{}: no usable slug for {:?}, skipping", category, entity.name);
            skipped += 1;
            continue;
        }
        let html = template::detail_page(
            &format!("{} | {}", entity.name, title_suffix),
            &entity.name,
            &entity.description,
        );
        write_page(&staging, &format!("{}.html", slug), &html)?;
        debug!("{}: rendered {}", category, slug);
        links.push((slug, entity.name.as_str()));
    }

    let index_links: Vec<IndexLink<'_>> = links
        .iter()
        .map(|(slug, name)| IndexLink {
            slug: slug.as_str(),
            name: *name,
        })
        .collect();
    write_page(
        &staging,
        INDEX_FILE,
        &template::index_page(category.as_str(), &index_links),
    )?;

    swap_in(&staging, &out_dir)?;

    Ok(GenerateStats {
        category: category.clone(),
        written: links.len(),
        skipped,
        out_dir,
    })
}

fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| PipelineError::persistence(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| PipelineError::persistence(dir, e))
}

fn write_page(dir: &Path, file: &str, html: &str) -> Result<()> {
    let path = dir.join(file);
    fs::write(&path, html).map_err(|e| {
        let _ = fs::remove_dir_all(dir);
        PipelineError::persistence(&path, e)
    })
}

/// Replace `live` with the fully written `staging` directory.
fn swap_in(staging: &Path, live: &Path) -> Result<()> {
    let retired = live.with_extension("old");
    if retired.exists() {
        fs::remove_dir_all(&retired).map_err(|e| PipelineError::persistence(&retired, e))?;
    }
    if live.exists() {
        fs::rename(live, &retired).map_err(|e| PipelineError::persistence(live, e))?;
    }
    fs::rename(staging, live).map_err(|e| PipelineError::persistence(live, e))?;
    if retired.exists() {
        fs::remove_dir_all(&retired).map_err(|e| PipelineError::persistence(&retired, e))?;
    }
    Ok(())
}
