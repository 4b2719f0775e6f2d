//! Marks changed lines of a result buffer.

use crate::diff::{changed_lines, LineSequence};
use crate::editor::{Annotation, AnnotationStyle, TextBuffer};

/// Replaces every annotation on `buffer` with one `Changed` mark per line of
/// `modified` that is not shared with `original`.
///
/// Each mark spans the whole line using its character length, so blank lines get a
/// zero-width mark. Prior annotations are always cleared first, which makes repeated
/// calls with the same inputs converge on the same annotation set.
pub fn render_highlights(original: &str, modified: &str, buffer: &mut dyn TextBuffer) {
    buffer.clear_annotations();

    let original = LineSequence::from_text(original);
    let modified = LineSequence::from_text(modified);
    let diff = changed_lines(original.as_slice(), modified.as_slice());

    for &line in diff.changed() {
        let width = modified.get(line).map_or(0, |l| l.chars().count());
        buffer.add_annotation(Annotation::whole_line(line, width, AnnotationStyle::Changed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MemoryBuffer;

    #[test]
    fn marks_full_width_of_changed_lines() {
        let mut buf = MemoryBuffer::new("");
        render_highlights("a\nb\nc", "a\nxyz\n\nc", &mut buf);
        assert_eq!(
            buf.annotations(),
            &[
                Annotation::whole_line(1, 3, AnnotationStyle::Changed),
                Annotation::whole_line(2, 0, AnnotationStyle::Changed),
            ]
        );
    }

    #[test]
    fn clears_stale_annotations() {
        let mut buf = MemoryBuffer::new("");
        buf.add_annotation(Annotation::whole_line(9, 4, AnnotationStyle::Changed));
        render_highlights("same", "same", &mut buf);
        assert!(buf.annotations().is_empty());
    }

    #[test]
    fn repeated_rendering_is_idempotent() {
        let mut once = MemoryBuffer::new("");
        render_highlights("x = 1\ny = 2", "x = 1\ny = 20\nz = 3", &mut once);

        let mut twice = MemoryBuffer::new("");
        render_highlights("x = 1\ny = 2", "x = 1\ny = 20\nz = 3", &mut twice);
        render_highlights("x = 1\ny = 2", "x = 1\ny = 20\nz = 3", &mut twice);

        assert_eq!(once.annotations(), twice.annotations());
    }

    #[test]
    fn counts_characters_not_bytes() {
        let mut buf = MemoryBuffer::new("");
        render_highlights("", "naïve", &mut buf);
        assert_eq!(buf.annotations()[0].end_col, 5);
    }
}
