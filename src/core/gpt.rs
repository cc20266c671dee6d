//! External graph-processing tool invocation.
//!
//! The interferometric processing itself happens inside ESA SNAP's `gpt`
//! executable; this module builds the invocation, streams the tool's
//! output into the log as it arrives, and maps its exit status into the
//! pipeline error types.

use crate::types::{InsarError, InsarResult};
use serde::Deserialize;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Product name the processing graph is asked to write.
pub const TARGET_PRODUCT: &str = "insar_filtered.dim";

/// Capability to run a processing graph over a scene pair.
///
/// The binaries depend on this trait rather than on [`SnapGpt`] directly
/// so orchestration can be exercised without a SNAP installation.
pub trait GraphRunner {
    /// Run `graph` over the two scene paths, writing products under
    /// `out_dir`. Returns the product paths found there afterwards.
    fn run(
        &self,
        graph: &Path,
        reference: &Path,
        secondary: &Path,
        out_dir: &Path,
    ) -> InsarResult<Vec<PathBuf>>;
}

/// Invokes the `gpt` executable as a subprocess.
pub struct SnapGpt {
    gpt_path: PathBuf,
}

impl SnapGpt {
    pub fn new<P: Into<PathBuf>>(gpt_path: P) -> Self {
        SnapGpt {
            gpt_path: gpt_path.into(),
        }
    }
}

impl GraphRunner for SnapGpt {
    fn run(
        &self,
        graph: &Path,
        reference: &Path,
        secondary: &Path,
        out_dir: &Path,
    ) -> InsarResult<Vec<PathBuf>> {
        std::fs::create_dir_all(out_dir)?;
        let target = out_dir.join(TARGET_PRODUCT);

        log::info!(
            "Running {} {} -> {}",
            self.gpt_path.display(),
            graph.display(),
            target.display()
        );
        let started = Instant::now();

        // One pipe for both streams so the tool's stdout and stderr
        // interleave in arrival order. The Command temporary must drop
        // right after spawn or the parent's writer ends keep the pipe
        // open and the reader never sees EOF.
        let (pipe_reader, pipe_writer) = std::io::pipe()?;
        let stderr_writer = pipe_writer.try_clone()?;
        let mut child = Command::new(&self.gpt_path)
            .arg(graph)
            .arg(format!("-Pmaster={}", reference.display()))
            .arg(format!("-Pslave={}", secondary.display()))
            .arg(format!("-Ptarget_product={}", target.display()))
            .stdin(Stdio::null())
            .stdout(pipe_writer)
            .stderr(stderr_writer)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    InsarError::ToolNotFound(self.gpt_path.display().to_string())
                }
                _ => InsarError::Io(e),
            })?;

        for line in BufReader::new(pipe_reader).lines() {
            log::info!("{}", line?.trim_end());
        }

        let status = child.wait()?;
        let elapsed = format_hms(started.elapsed());
        if !status.success() {
            let code = status.code().unwrap_or(-1);
            log::error!("gpt failed after {} (exit code {})", elapsed, code);
            return Err(InsarError::Processing(code));
        }
        log::info!("gpt finished in {}", elapsed);

        let products = find_products(out_dir)?;
        for product in &products {
            log::info!("Product: {}", product.display());
        }
        Ok(products)
    }
}

/// Summary of a processing-graph XML file, logged before invocation.
#[derive(Debug)]
pub struct GraphSummary {
    pub operators: Vec<String>,
}

impl std::fmt::Display for GraphSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} node(s): {}",
            self.operators.len(),
            self.operators.join(", ")
        )
    }
}

#[derive(Debug, Deserialize)]
struct GraphXml {
    #[serde(rename = "node", default)]
    nodes: Vec<GraphNode>,
}

#[derive(Debug, Deserialize)]
struct GraphNode {
    operator: String,
}

/// Read and sanity-check a graph file. A graph that cannot be read or
/// parsed is a configuration problem caught before any process spawns.
pub fn summarize_graph(path: &Path) -> InsarResult<GraphSummary> {
    let xml = std::fs::read_to_string(path).map_err(|e| {
        InsarError::Configuration(format!("cannot read graph file {}: {}", path.display(), e))
    })?;
    parse_graph(&xml)
        .map_err(|e| InsarError::Configuration(format!("graph file {}: {}", path.display(), e)))
}

fn parse_graph(xml: &str) -> Result<GraphSummary, String> {
    let parsed: GraphXml = quick_xml::de::from_str(xml).map_err(|e| e.to_string())?;
    if parsed.nodes.is_empty() {
        return Err("graph contains no processing nodes".to_string());
    }
    Ok(GraphSummary {
        operators: parsed.nodes.into_iter().map(|n| n.operator).collect(),
    })
}

/// Wall time as HH:MM:SS.
pub fn format_hms(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Product files the tool left in `out_dir`: BEAM-DIMAP headers and
/// GeoTIFFs at the top level.
fn find_products(dir: &Path) -> InsarResult<Vec<PathBuf>> {
    let mut products = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("dim") | Some("tif") | Some("tiff") => products.push(path),
            _ => {}
        }
    }
    products.sort();
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graph id="InSAR">
  <version>1.0</version>
  <node id="Read">
    <operator>Read</operator>
    <sources/>
    <parameters><file>${master}</file></parameters>
  </node>
  <node id="Read(2)">
    <operator>Read</operator>
    <sources/>
    <parameters><file>${slave}</file></parameters>
  </node>
  <node id="Back-Geocoding">
    <operator>Back-Geocoding</operator>
    <sources><sourceProduct refid="Read"/><sourceProduct.1 refid="Read(2)"/></sources>
    <parameters/>
  </node>
  <node id="Interferogram">
    <operator>Interferogram</operator>
    <sources><sourceProduct refid="Back-Geocoding"/></sources>
    <parameters/>
  </node>
  <node id="Write">
    <operator>Write</operator>
    <sources><sourceProduct refid="Interferogram"/></sources>
    <parameters><file>${target_product}</file></parameters>
  </node>
</graph>"#;

    #[test]
    fn test_parse_graph_lists_operators() {
        let summary = parse_graph(GRAPH).expect("parse graph");
        assert_eq!(
            summary.operators,
            vec!["Read", "Read", "Back-Geocoding", "Interferogram", "Write"]
        );
        assert_eq!(
            summary.to_string(),
            "5 node(s): Read, Read, Back-Geocoding, Interferogram, Write"
        );
    }

    #[test]
    fn test_parse_graph_rejects_junk() {
        assert!(parse_graph("not xml at all").is_err());
        assert!(parse_graph("<graph id=\"empty\"><version>1.0</version></graph>").is_err());
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_hms(Duration::from_secs(59)), "00:00:59");
        assert_eq!(format_hms(Duration::from_secs(3661)), "01:01:01");
        assert_eq!(format_hms(Duration::from_secs(10 * 3600 + 42)), "10:00:42");
    }

    #[test]
    fn test_find_products_filters_extensions() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        for name in ["a.dim", "b.tif", "c.tiff", "notes.txt", "phase.img"] {
            std::fs::write(dir.path().join(name), b"x").expect("write");
        }
        let mut names: Vec<String> = find_products(dir.path())
            .expect("scan")
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.dim", "b.tif", "c.tiff"]);
    }
}
