use std::error::Error;
use std::fs;
use std::sync::Arc;

use assetpipe::pipeline::{Pipeline, run_series};
use assetpipe_test_utils::builders::ProjectFixture;
use assetpipe_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const EXPECTED_LAYOUT: &[&str] = &[
    "about.html",
    "css/style.min.css",
    "fonts/body.woff2",
    "images/icons/Arrow Left.svg",
    "images/icons/home.svg",
    "images/icons/sprite.css",
    "images/icons/sprite.svg",
    "images/logo.svg",
    "images/photo.png",
    "index.html",
    "js/main.min.js",
];

fn snapshot(fixture: &ProjectFixture) -> Vec<(String, Vec<u8>)> {
    fixture
        .output_files()
        .into_iter()
        .map(|rel| {
            let bytes = fs::read(fixture.output(&rel)).unwrap();
            (rel, bytes)
        })
        .collect()
}

#[tokio::test]
async fn build_produces_the_full_output_layout() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().sample_site();

    run_series(&Pipeline::build(), Arc::new(fixture.project())).await?;

    assert_eq!(fixture.output_files(), EXPECTED_LAYOUT);

    let index = fs::read_to_string(fixture.output("index.html"))?;
    assert!(index.contains("<header>Home</header>"));
    assert!(!index.contains("@include"));

    let css = fs::read_to_string(fixture.output("css/style.min.css"))?;
    assert!(css.contains("margin:0"));
    assert!(css.contains("#c33"));
    assert!(css.contains("-webkit-user-select:none"), "{css}");
    assert!(css.contains("user-select:none"), "{css}");
    assert!(!css.contains('\n'), "stylesheet should be compressed: {css}");

    let js = fs::read_to_string(fixture.output("js/main.min.js"))?;
    assert!(!js.is_empty());
    assert!(js.len() < "function greet(name) {\n  return 'hi ' + name;\n}\ngreet('x');\n".len());

    let font = fs::read(fixture.output("fonts/body.woff2"))?;
    assert_eq!(font, b"not-really-a-font");
    Ok(())
}

#[tokio::test]
async fn build_adds_ms_grid_for_internet_explorer_targets() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().sample_site().with_config(|c| {
        c.styles.browserslist = vec!["last 2 versions".into(), "ie 11".into()];
    });

    run_series(&Pipeline::build(), Arc::new(fixture.project())).await?;

    let css = fs::read_to_string(fixture.output("css/style.min.css"))?;
    assert!(css.contains("display:-ms-grid;display:grid"), "{css}");
    assert!(css.contains("-ms-grid-columns:(1fr)[2]"), "{css}");
    assert!(css.contains("-ms-grid-column:1;-ms-grid-column-span:2;grid-column:1/3"), "{css}");
    Ok(())
}

#[tokio::test]
async fn build_is_reproducible_and_idempotent() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().sample_site();
    let project = Arc::new(fixture.project());

    run_series(&Pipeline::build(), Arc::clone(&project)).await?;
    let first = snapshot(&fixture);

    run_series(&Pipeline::build(), project).await?;
    let second = snapshot(&fixture);

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn build_recreates_a_deleted_output_tree() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().sample_site();
    let project = Arc::new(fixture.project());

    run_series(&Pipeline::build(), Arc::clone(&project)).await?;
    let before = fixture.output_files();

    fs::remove_dir_all(project.output_dir())?;
    assert!(fixture.output_files().is_empty());

    run_series(&Pipeline::build(), project).await?;
    assert_eq!(fixture.output_files(), before);
    Ok(())
}

#[tokio::test]
async fn build_removes_stale_outputs() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new()
        .sample_site()
        .file("dist/stale.txt", "left over");

    run_series(&Pipeline::build(), Arc::new(fixture.project())).await?;

    assert!(!fixture.output("stale.txt").exists());
    Ok(())
}

#[tokio::test]
async fn missing_include_fails_build_and_skips_that_page() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new()
        .sample_site()
        .source("broken.html", "<body>@include('partials/nope.html')</body>");

    let result = run_series(&Pipeline::build(), Arc::new(fixture.project())).await;

    let err = result.expect_err("build should fail on a missing include");
    assert!(format!("{err:#}").contains("htmlInclude"), "{err:#}");
    assert!(!fixture.output("broken.html").exists());
    assert!(fixture.output("index.html").exists());
    // Later stages never ran.
    assert!(!fixture.output("css/style.min.css").exists());
    assert!(!fixture.output("fonts/body.woff2").exists());
    Ok(())
}

#[tokio::test]
async fn assemble_prefers_prebuilt_bundles() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new()
        .sample_site()
        .source("css/style.min.css", "body{color:red}")
        .source("js/main.min.js", "var prebuilt=1;");

    run_series(&Pipeline::build(), Arc::new(fixture.project())).await?;

    assert_eq!(
        fs::read_to_string(fixture.output("css/style.min.css"))?,
        "body{color:red}"
    );
    assert_eq!(
        fs::read_to_string(fixture.output("js/main.min.js"))?,
        "var prebuilt=1;"
    );
    Ok(())
}

#[tokio::test]
async fn single_task_pipeline_only_writes_its_outputs() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().sample_site();

    let pipeline = Pipeline::for_target(assetpipe::cli::Target::Styles);
    run_series(&pipeline, Arc::new(fixture.project())).await?;

    assert_eq!(fixture.output_files(), vec!["css/style.min.css"]);
    Ok(())
}

#[tokio::test]
async fn clean_dist_is_idempotent() -> TestResult {
    init_tracing();
    let fixture = ProjectFixture::new().file("dist/a/b.txt", "x");
    let project = fixture.project();

    assetpipe::tasks::clean::clean_dist(&project)?;
    assert!(!project.output_dir().exists());

    assetpipe::tasks::clean::clean_dist(&project)?;
    assert!(!project.output_dir().exists());
    Ok(())
}
