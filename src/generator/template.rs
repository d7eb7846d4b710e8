use crate::utils::truncate_chars;

pub const META_DESCRIPTION_MAX: usize = 160;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Attribute-safe description, at most 160 chars, never ending mid-entity.
pub fn meta_description(text: &str) -> String {
    let escaped = escape_html(text);
    let cut = truncate_chars(&escaped, META_DESCRIPTION_MAX);
    match cut.rfind('&') {
        Some(amp) if !cut[amp..].contains(';') => cut[..amp].to_string(),
        _ => cut.to_string(),
    }
}

pub fn detail_page(title: &str, heading: &str, description: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title}</title>
<meta name="description" content="{meta}" />
<script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="text-white bg-slate-950">
<div class="container mx-auto px-6 py-10 max-w-3xl">
<h1 class="font-gaming text-3xl">{heading}</h1>
<p class="text-gray-300 mt-4">{body}</p>
</div>
</body>
</html>
"#,
        title = escape_html(title),
        meta = meta_description(description),
        heading = escape_html(heading),
        body = escape_html(description),
    )
}

pub struct IndexLink<'a> {
    pub slug: &'a str,
    pub name: &'a str,
}

pub fn index_page(category: &str, links: &[IndexLink<'_>]) -> String {
    let items = links
        .iter()
        .map(|l| {
            format!(
                r#"<li><a class="text-cyan-300" href="./{}.html">{}</a></li>"#,
                l.slug,
                escape_html(l.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{category} Index</title>
<script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="text-white bg-slate-950">
<div class="container mx-auto px-6 py-10">
<h1 class="font-gaming text-3xl mb-6">{category} Index</h1>
<ul class="list-disc pl-6">{items}</ul>
</div>
</body>
</html>
"#
    )
}
