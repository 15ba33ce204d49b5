use log::debug;

/// Opening marker of a documentation comment block.
pub const BLOCK_START: &str = "/**";
/// Closing marker of any block comment.
pub const BLOCK_END: &str = "*/";

/// Line scanner for documentation comment blocks.
///
/// The `CommentScanner` recognises `/** ... */` blocks in raw source text one line at a
/// time. It performs no interpretation of the block's contents; see
/// [`crate::doc_comment::DocComment`] for that.
///
/// # Example
///
/// ```
/// use openapi_from_routes::scanner::CommentScanner;
///
/// let lines = vec!["/**", " * 获取所有标签", " */", "router.get('/all', ctrl.all)"];
/// let (block, next) = CommentScanner::read_block(&lines, 0);
/// assert_eq!(next, 3);
/// assert!(block.unwrap().text.contains("获取所有标签"));
/// ```
pub struct CommentScanner;

/// The literal text of one documentation comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Raw lines of the block joined with `\n`, delimiters included
    pub text: String,
    /// Zero-based index of the block's first line
    pub start_line: usize,
    /// False when the file ended before the closing marker
    pub terminated: bool,
}

impl CommentScanner {
    /// Whether `line` opens a documentation block.
    pub fn starts_block(line: &str) -> bool {
        line.trim_start().starts_with(BLOCK_START)
    }

    /// Reads the documentation block starting at `start`, if there is one.
    ///
    /// When the trimmed line at `start` begins with `/**`, lines are consumed up to and
    /// including the first line containing `*/`. An unterminated block takes every
    /// remaining line instead of failing.
    ///
    /// # Returns
    ///
    /// The block (or `None`) and the index of the first line after it. When no block
    /// starts at `start` the index is returned unchanged.
    pub fn read_block(lines: &[&str], start: usize) -> (Option<CommentBlock>, usize) {
        let Some(first) = lines.get(start) else {
            return (None, start);
        };
        if !Self::starts_block(first) {
            return (None, start);
        }

        let after_open = &first.trim_start()[BLOCK_START.len()..];
        if after_open.contains(BLOCK_END) {
            return (
                Some(CommentBlock {
                    text: first.to_string(),
                    start_line: start,
                    terminated: true,
                }),
                start + 1,
            );
        }

        let mut end = start + 1;
        let mut terminated = false;
        while end < lines.len() {
            let closes = lines[end].contains(BLOCK_END);
            end += 1;
            if closes {
                terminated = true;
                break;
            }
        }

        if !terminated {
            debug!("Unterminated doc comment starting at line {}", start + 1);
        }

        (
            Some(CommentBlock {
                text: lines[start..end].join("\n"),
                start_line: start,
                terminated,
            }),
            end,
        )
    }
}
