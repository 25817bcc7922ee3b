use std::error::Error;
use std::path::Path;

use assetpipe::tasks::grid::lower_grid;
use assetpipe::tasks::styles::prefix_and_minify;

type TestResult = Result<(), Box<dyn Error>>;

fn browsers(queries: &[&str]) -> Vec<String> {
    queries.iter().map(|q| q.to_string()).collect()
}

#[test]
fn grid_declarations_get_their_ms_form_first() {
    let css = ".g{display:grid;grid-template-columns:1fr 1fr;grid-column:1/3}";

    assert_eq!(
        lower_grid(css),
        ".g{display:-ms-grid;display:grid;-ms-grid-columns:1fr 1fr;grid-template-columns:1fr 1fr;\
         -ms-grid-column:1;-ms-grid-column-span:2;grid-column:1/3}"
    );
}

#[test]
fn repeat_tracks_use_the_ms_count_syntax() {
    assert_eq!(
        lower_grid(".a{grid-template-rows:repeat(3,minmax(10px,1fr)) 40px}"),
        ".a{-ms-grid-rows:(minmax(10px,1fr))[3] 40px;grid-template-rows:repeat(3,minmax(10px,1fr)) 40px}"
    );
}

#[test]
fn placement_forms_map_to_line_and_span() {
    assert_eq!(
        lower_grid(".a{grid-row:2/span 3}"),
        ".a{-ms-grid-row:2;-ms-grid-row-span:3;grid-row:2/span 3}"
    );
    assert_eq!(
        lower_grid(".a{grid-area:1/2/3/5}"),
        ".a{-ms-grid-row:1;-ms-grid-row-span:2;-ms-grid-column:2;-ms-grid-column-span:3;grid-area:1/2/3/5}"
    );
    assert_eq!(
        lower_grid(".a{grid-column-start:4;grid-column-end:span 2}"),
        ".a{-ms-grid-column:4;grid-column-start:4;-ms-grid-column-span:2;grid-column-end:span 2}"
    );
    assert_eq!(
        lower_grid(".a{display:inline-grid!important}"),
        ".a{display:-ms-inline-grid!important;display:inline-grid!important}"
    );
}

#[test]
fn grid_forms_without_an_ms_equivalent_are_untouched() {
    let css = ".a{grid-template-columns:[full] 1fr [end];grid-template-rows:repeat(auto-fill,10px);\
               grid-column:main;grid-area:header;display:flex}\
               .b{content:\"{display:grid}\"}";

    assert_eq!(lower_grid(css), css);
}

#[test]
fn nested_blocks_are_lowered_and_existing_ms_declarations_kept_once() {
    let css = "@media (min-width:600px){.a{display:-ms-grid;display:grid}}.b{color:red}";

    assert_eq!(lower_grid(css), css);
    assert_eq!(
        lower_grid("@media print{.a{display:grid}}"),
        "@media print{.a{display:-ms-grid;display:grid}}"
    );
}

#[test]
fn ie_targets_get_grid_and_vendor_prefixes() -> TestResult {
    let css = ".g{display:grid;grid-template-columns:1fr 1fr;grid-column:1/3}.u{user-select:none}";

    let out = prefix_and_minify(css, &browsers(&["ie 11", "safari 12"]), Path::new("style.scss"))?;

    assert!(out.contains("display:-ms-grid"), "{out}");
    assert!(out.contains("-ms-grid-columns:1fr 1fr"), "{out}");
    assert!(out.contains("-ms-grid-column:1"), "{out}");
    assert!(out.contains("-ms-grid-column-span:2"), "{out}");
    assert!(out.contains("-webkit-user-select:none"), "{out}");
    Ok(())
}

#[test]
fn modern_targets_get_no_ms_grid() -> TestResult {
    let css = ".g{display:grid;grid-template-columns:1fr 1fr}";

    let out = prefix_and_minify(css, &browsers(&["last 2 chrome versions"]), Path::new("style.scss"))?;

    assert!(!out.contains("-ms-grid"), "{out}");
    assert!(out.contains("display:grid"), "{out}");
    Ok(())
}
