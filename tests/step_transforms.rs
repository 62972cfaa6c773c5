use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use sitepipe::pipeline::Asset;
use sitepipe::pipeline::images::ImageCompressor;
use sitepipe::pipeline::markup::HtmlCleaner;
use sitepipe::pipeline::registry::{apply_rename, glob_base};
use sitepipe::pipeline::render::Renderer;
use sitepipe::config::RenameRule;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn html_clean_trims_before_doctype_and_strips_comments() -> TestResult {
    let cleaner = HtmlCleaner::new(true);
    let input = "\n  stray include output\n<!DOCTYPE html>\n<html><body><!-- internal\nnote --><p>hi</p></body></html>";

    let out = cleaner
        .apply(Asset::new("index.ejs", input.as_bytes().to_vec()))?
        .expect("step keeps the file");
    let html = String::from_utf8(out.contents)?;

    assert!(html.starts_with("<!DOCTYPE html>"), "got: {html}");
    assert!(!html.contains("<!--"));
    assert!(html.contains("<p>hi</p>"));

    Ok(())
}

#[test]
fn html_clean_can_keep_comments() -> TestResult {
    let cleaner = HtmlCleaner::new(false);
    let input = "<!DOCTYPE html><body><!-- keep --></body>";

    let out = cleaner
        .apply(Asset::new("a.ejs", input.as_bytes().to_vec()))?
        .expect("step keeps the file");
    assert!(String::from_utf8(out.contents)?.contains("<!-- keep -->"));

    Ok(())
}

#[test]
fn rename_rules_cover_extension_and_suffix() {
    let ext_only = RenameRule {
        ext: Some(".html".into()),
        suffix: None,
    };
    assert_eq!(
        apply_rename(Path::new("sub/page.ejs"), &ext_only),
        PathBuf::from("sub/page.html")
    );

    let minified = RenameRule {
        ext: Some(".css".into()),
        suffix: Some(".min".into()),
    };
    assert_eq!(
        apply_rename(Path::new("style.scss"), &minified),
        PathBuf::from("style.min.css")
    );

    let suffix_only = RenameRule {
        ext: None,
        suffix: Some(".bundle".into()),
    };
    assert_eq!(
        apply_rename(Path::new("app.js"), &suffix_only),
        PathBuf::from("app.bundle.js")
    );
}

#[test]
fn glob_bases_are_the_static_prefixes() {
    assert_eq!(glob_base("src/scss/**/*.scss"), PathBuf::from("src/scss"));
    assert_eq!(
        glob_base("src/img/*.{jpg,jpeg,png,gif,svg}"),
        PathBuf::from("src/img")
    );
    assert_eq!(glob_base("*.txt"), PathBuf::from(""));
}

#[test]
fn templates_render_with_partial_includes() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ejs = tmp.path().join("src/ejs");
    fs::create_dir_all(&ejs)?;
    fs::write(ejs.join("_head.ejs"), "<title>demo</title>")?;
    fs::write(
        ejs.join("index.ejs"),
        "<!DOCTYPE html><html>{% include \"_head.ejs\" %}<body>{{ 40 + 2 }}</body></html>",
    )?;

    let renderer = Renderer::new(&ejs)?;

    let out = renderer
        .apply(Asset::new("index.ejs", Vec::new()))?
        .expect("rendered page");
    let html = String::from_utf8(out.contents)?;

    assert!(html.contains("<title>demo</title>"));
    assert!(html.contains("42"));

    Ok(())
}

#[test]
fn recompressed_png_stays_decodable() -> TestResult {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        16,
        16,
        image::Rgba([200, 30, 30, 255]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;

    let compressor = ImageCompressor::new(80);
    let out = compressor
        .apply(Asset::new("logo.png", bytes))?
        .expect("image kept");

    let decoded = image::load_from_memory(&out.contents)?;
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.height(), 16);

    Ok(())
}

#[test]
fn unknown_image_formats_pass_through_unchanged() -> TestResult {
    let compressor = ImageCompressor::new(80);

    let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();
    let out = compressor
        .apply(Asset::new("icon.svg", svg.clone()))?
        .expect("svg kept");
    assert_eq!(out.contents, svg);

    // GIFs are not recompressed either; bytes are never decoded.
    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
    let out = compressor
        .apply(Asset::new("spinner.gif", gif.clone()))?
        .expect("gif kept");
    assert_eq!(out.contents, gif);

    Ok(())
}

#[test]
fn broken_sibling_template_does_not_block_the_renderer() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let ejs = tmp.path().join("src/ejs");
    fs::create_dir_all(&ejs)?;
    fs::write(ejs.join("good.ejs"), "<!DOCTYPE html><body>{{ 1 + 1 }}</body>")?;
    fs::write(ejs.join("broken.ejs"), "{% if %}")?;

    let renderer = Renderer::new(&ejs)?;

    let out = renderer
        .apply(Asset::new("good.ejs", Vec::new()))?
        .expect("rendered page");
    assert!(String::from_utf8(out.contents)?.contains('2'));

    // The broken page fails on its own at render time.
    assert!(renderer.apply(Asset::new("broken.ejs", Vec::new())).is_err());

    Ok(())
}

#[cfg(unix)]
mod filter_commands {
    use super::*;
    use sitepipe::errors::StepError;
    use sitepipe::pipeline::exec::CommandFilter;

    #[test]
    fn filter_command_pipes_stdin_to_stdout() -> TestResult {
        let filter = CommandFilter::new("tr a-z A-Z");
        let out = filter
            .apply(Asset::new("main.js", b"let answer = 42;".to_vec()))?
            .expect("filtered file");
        assert_eq!(out.contents, b"LET ANSWER = 42;");
        Ok(())
    }

    #[test]
    fn failing_filter_command_reports_status_and_stderr() {
        let filter = CommandFilter::new("echo boom >&2; exit 3");
        let err = filter
            .apply(Asset::new("main.js", Vec::new()))
            .expect_err("command fails");

        match err {
            StepError::Command { status, stderr } => {
                assert_eq!(status, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
