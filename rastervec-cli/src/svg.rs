//! Minimal SVG backend over the trace data model.
//!
//! One `<path>` element per top-level outline, with the outline's holes and
//! islands as subpaths so the even-odd fill rule renders them correctly.
//! The core's y axis points up; coordinates are flipped here so the SVG
//! matches the input image orientation.

use std::fmt::Write as _;

use rastervec_core::{PathNode, Segment, Trace};

/// Render a trace as a standalone SVG document.
pub fn render_document(trace: &Trace, width: u32, height: u32) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg width="{width}" height="{height}" viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">"#
    );
    for root in trace.roots() {
        let mut data = String::new();
        subtree_path_data(root, height as f64, &mut data);
        let _ = writeln!(svg, r#"  <path d="{}" fill="black" fill-rule="evenodd"/>"#, data.trim_end());
    }
    svg.push_str("</svg>\n");
    svg
}

fn subtree_path_data(node: &PathNode, height: f64, out: &mut String) {
    curve_path_data(node, height, out);
    for child in node.children() {
        subtree_path_data(child, height, out);
    }
}

fn curve_path_data(node: &PathNode, height: f64, out: &mut String) {
    let curve = node.curve();
    let Some(start) = curve.start() else {
        return;
    };
    let _ = write!(out, "M {:.3} {:.3} ", start.x, height - start.y);
    for seg in curve.segments() {
        match *seg {
            Segment::Corner { c1, end } => {
                let _ = write!(
                    out,
                    "L {:.3} {:.3} L {:.3} {:.3} ",
                    c1.x,
                    height - c1.y,
                    end.x,
                    height - end.y
                );
            }
            Segment::Bezier { c0, c1, end } => {
                let _ = write!(
                    out,
                    "C {:.3} {:.3} {:.3} {:.3} {:.3} {:.3} ",
                    c0.x,
                    height - c0.y,
                    c1.x,
                    height - c1.y,
                    end.x,
                    height - end.y
                );
            }
        }
    }
    out.push_str("Z ");
}
