//! Server-rendered HTML pages.

use reel_models::RenderMode;

const STYLE: &str = "body{font-family:sans-serif;max-width:720px;margin:2rem auto;padding:0 1rem;color:#1d2b3a}\
h1{color:#2d5072}label{display:block;margin-top:1rem;font-weight:bold}\
input,textarea,select{width:100%;padding:.4rem;margin-top:.3rem;box-sizing:border-box}\
button{margin-top:1.5rem;padding:.6rem 1.4rem;background:#2d5072;color:#fff;border:0}\
.error{border-left:4px solid #b3261e;padding:.5rem 1rem;background:#fbeaea}\
pre{white-space:pre-wrap;background:#f4f4f4;padding:.6rem}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLE,
        body
    )
}

/// Escape text for use in element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn mode_label(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Default => "Default music with captioned images",
        RenderMode::Ai => "AI narration of the caption",
        RenderMode::MergeOnly => "Merge clips only (keep their audio)",
        RenderMode::TransformMerge => "Transform and merge clips",
        RenderMode::TransformAddMusic => "Transform, merge and add music",
    }
}

/// The upload form.
pub fn index_page(max_files: usize) -> String {
    let options: String = RenderMode::ALL
        .iter()
        .map(|mode| {
            format!(
                "<option value=\"{}\">{}</option>",
                mode.as_str(),
                mode_label(*mode)
            )
        })
        .collect();

    let body = format!(
        "<h1>ReelForge</h1>\n\
         <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <label for=\"title\">Video Title / వీడియో శీర్షిక</label>\n\
         <input id=\"title\" name=\"title\" maxlength=\"120\" required>\n\
         <label for=\"caption\">Caption / క్యాప్షన్</label>\n\
         <textarea id=\"caption\" name=\"caption\" rows=\"6\"></textarea>\n\
         <label for=\"orientation\">Orientation</label>\n\
         <select id=\"orientation\" name=\"orientation\">\
         <option value=\"portrait\">Portrait (1080x1920)</option>\
         <option value=\"landscape\">Landscape (1920x1080)</option></select>\n\
         <label for=\"music_option\">Audio</label>\n\
         <select id=\"music_option\" name=\"music_option\">{options}</select>\n\
         <label for=\"media\">Images (.jpg .jpeg .png .webp) or clips (.mp4), up to {max_files}</label>\n\
         <input id=\"media\" type=\"file\" name=\"media\" multiple \
         accept=\".jpg,.jpeg,.png,.webp,.mp4\">\n\
         <button type=\"submit\">Create video</button>\n\
         </form>"
    );

    layout("ReelForge", &body)
}

/// Page shown once the artifact is ready.
pub fn result_page(basename: &str) -> String {
    let name = escape_html(basename);
    let body = format!(
        "<h1>Your video is ready</h1>\n\
         <p>మీ వీడియో సిద్ధంగా ఉంది.</p>\n\
         <video src=\"/video/{name}\" controls playsinline style=\"max-width:100%\"></video>\n\
         <p><a href=\"/video/{name}\" download=\"{name}\">Download {name}</a></p>\n\
         <p><a href=\"/\">Create another video</a></p>"
    );
    layout("Video ready", &body)
}

/// Bilingual error page; `detail` is the technical cause when it may be shown.
pub fn error_page(english: &str, telugu: &str, detail: Option<&str>) -> String {
    let detail = detail
        .map(|d| format!("<pre>{}</pre>\n", escape_html(d)))
        .unwrap_or_default();
    let body = format!(
        "<h1>Something went wrong</h1>\n\
         <div class=\"error\">\n<p>{}</p>\n<p>{}</p>\n</div>\n{}\
         <p><a href=\"/\">Back</a></p>",
        escape_html(english),
        escape_html(telugu),
        detail
    );
    layout("Error", &body)
}
