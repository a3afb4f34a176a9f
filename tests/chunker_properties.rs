//! Property tests for the chunker's ordering and atomicity invariants.

use legisearch::transform::chunk;
use proptest::prelude::*;

fn paragraph() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..30).prop_map(|words| words.join(" "))
}

fn document() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(paragraph(), 0..12)
}

proptest! {
    #[test]
    fn chunk_numbers_are_contiguous_from_one(paragraphs in document(), max_length in 1usize..40) {
        let text = paragraphs.join("\n\n");
        let chunks = chunk(&text, max_length);

        for (i, c) in chunks.iter().enumerate() {
            prop_assert_eq!(c.chunk_number, i as u32 + 1);
        }
    }

    #[test]
    fn no_text_is_lost_or_reordered(paragraphs in document(), max_length in 1usize..40) {
        let text = paragraphs.join("\n\n");
        let chunks = chunk(&text, max_length);

        let reassembled = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(reassembled, paragraphs.join(" "));
    }

    #[test]
    fn chunks_are_whole_paragraph_runs(paragraphs in document(), max_length in 1usize..40) {
        let text = paragraphs.join("\n\n");
        let chunks = chunk(&text, max_length);

        // Each chunk must be the space-join of the next consecutive
        // paragraphs; a paragraph split across chunks would break the match.
        let mut remaining = paragraphs.as_slice();
        for c in &chunks {
            let mut taken = 0;
            let mut assembled = String::new();
            while assembled != c.text {
                prop_assert!(taken < remaining.len(), "chunk is not a paragraph run");
                if taken > 0 {
                    assembled.push(' ');
                }
                assembled.push_str(&remaining[taken]);
                taken += 1;
            }
            remaining = &remaining[taken..];
        }
        prop_assert!(remaining.is_empty());
    }

    #[test]
    fn only_single_oversized_paragraphs_exceed_the_budget(
        paragraphs in document(),
        max_length in 1usize..40,
    ) {
        let text = paragraphs.join("\n\n");
        let chunks = chunk(&text, max_length);

        for c in &chunks {
            let words = c.text.split_whitespace().count();
            if words > max_length {
                // Over-budget chunks are exactly one atomic paragraph.
                prop_assert!(paragraphs.iter().any(|p| p == &c.text));
            }
        }
    }
}
