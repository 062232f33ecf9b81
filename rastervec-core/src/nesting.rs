//! Path tree construction by xor-fill insideness.
//!
//! Contours arrive in discovery order: the scan runs top-down, so an
//! enclosing contour always precedes the contours inside it. Rendering the
//! head of a sublist into the scratch bitmap makes the insideness test for
//! every later path a single pixel read at the pixel just below its point 0
//! (its upper-left corner). Contours are nested iff their interior winding
//! numbers are, so this partition yields the correct tree.

use crate::bitmap::Bitmap;
use crate::contour::xor_path;
use crate::error::TraceResult;
use crate::path::Path;
use crate::progress::CancelToken;

/// Tree skeleton over the flat path list; indices refer into that list.
#[derive(Debug)]
pub(crate) struct NestNode {
    pub index: usize,
    pub children: Vec<NestNode>,
}

/// Arrange the flat path list into a forest. The scratch bitmap must have
/// the raster's dimensions; it is used as drawing scratch and left cleared.
pub(crate) fn resolve(
    paths: &[Path],
    scratch: &mut Bitmap,
    cancel: &CancelToken,
) -> TraceResult<Vec<NestNode>> {
    scratch.clear();
    resolve_sublist(paths, scratch, (0..paths.len()).collect(), cancel)
}

fn resolve_sublist(
    paths: &[Path],
    scratch: &mut Bitmap,
    mut list: Vec<usize>,
    cancel: &CancelToken,
) -> TraceResult<Vec<NestNode>> {
    let mut siblings = Vec::new();

    while let Some((&head, rest)) = list.split_first() {
        cancel.check()?;

        xor_path(scratch, &paths[head]);
        let bbox = paths[head].bbox();

        let mut inside = Vec::new();
        let mut outside = Vec::new();
        let mut it = rest.iter().copied();
        loop {
            let Some(idx) = it.next() else { break };
            cancel.check()?;
            let p0 = paths[idx].points()[0];
            if p0.y <= bbox.y0 {
                // everything from here on starts below the head's bounds
                // and cannot be inside it
                outside.push(idx);
                outside.extend(it);
                break;
            }
            if scratch.get(p0.x, p0.y - 1) {
                inside.push(idx);
            } else {
                outside.push(idx);
            }
        }

        scratch.clear_rect(&bbox);

        siblings.push(NestNode {
            index: head,
            children: resolve_sublist(paths, scratch, inside, cancel)?,
        });
        list = outside;
    }

    Ok(siblings)
}
