use super::{PdfBlob, PdfError};

/// A contiguous slice of the upload, combined into one output document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfGroup {
    /// 1-based position of the group in the output.
    pub number: usize,
    pub members: Vec<PdfBlob>,
}

/// Partitions `pdfs` into consecutive groups of `group_size`; only the final group may be
/// shorter. An empty input yields no groups.
pub fn group(pdfs: Vec<PdfBlob>, group_size: usize) -> Result<Vec<PdfGroup>, PdfError> {
    if group_size == 0 {
        return Err(PdfError::InvalidGroupSize(group_size));
    }

    let mut groups = Vec::with_capacity(pdfs.len().div_ceil(group_size));
    let mut remaining = pdfs.into_iter().peekable();
    while remaining.peek().is_some() {
        let members: Vec<PdfBlob> = remaining.by_ref().take(group_size).collect();
        groups.push(PdfGroup {
            number: groups.len() + 1,
            members,
        });
    }
    Ok(groups)
}
