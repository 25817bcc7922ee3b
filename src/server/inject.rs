// src/server/inject.rs

/// Path of the server-sent-events endpoint.
pub const RELOAD_ENDPOINT: &str = "/__assetpipe/reload";

/// Client script: full reload on `reload`, stylesheet cache-bust on `inject`.
pub const RELOAD_CLIENT: &str = concat!(
    "<script>(function(){",
    "var s=new EventSource(\"/__assetpipe/reload\");",
    "s.addEventListener(\"reload\",function(){location.reload()});",
    "s.addEventListener(\"inject\",function(){",
    "document.querySelectorAll('link[rel=\"stylesheet\"]').forEach(function(l){",
    "var u=new URL(l.href);u.searchParams.set(\"_r\",Date.now());l.href=u.toString()})",
    "});",
    "})();</script>"
);

/// Insert the reload client before the last `</body>`, or append it.
pub fn inject_reload_client(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len() + RELOAD_CLIENT.len());
    match lower.rfind("</body>") {
        Some(idx) => {
            out.push_str(&html[..idx]);
            out.push_str(RELOAD_CLIENT);
            out.push_str(&html[idx..]);
        }
        None => {
            out.push_str(html);
            out.push_str(RELOAD_CLIENT);
        }
    }
    out
}
