//! Context assembly pipeline.
//!
//! Produces one bounded text block for a generation call from three
//! sources, presented in this order:
//!
//! 1. **Question** (the current user query)
//! 2. **Top reference** (the highest-scoring retrieved chunk)
//! 3. **Conversation** (recent turns, newest first)
//! 4. **Further references** (remaining chunks by descending score)
//!
//! When the block would exceed the character budget, content is trimmed
//! in a fixed order: oldest conversation turns first, then lowest-scoring
//! extra references. The question and the top reference are a hard floor;
//! if they alone exceed the budget, the top reference's text (and as a
//! last resort the question's tail) is truncated on a char boundary.
//! Assembly never fails and the output never exceeds the budget.
//!
//! # Determinism
//!
//! Identical inputs always produce identical output; no random or
//! time-dependent logic is involved.

use campanile_core::chunk::RetrievalResult;
use campanile_core::session::Turn;
use serde::{Deserialize, Serialize};

/// The assembled block, ready to embed in a generation prompt.
#[derive(Debug, Clone)]
pub struct AssembledContext {
    pub prompt: String,
    pub metadata: AssemblyMetadata,
}

/// What went in, what was left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyMetadata {
    /// Characters in the final block.
    pub total_chars: usize,
    /// The configured budget.
    pub budget: usize,
    /// Per-section statistics.
    pub per_section: Vec<SectionStats>,
    /// Items dropped during trimming.
    pub drops: Vec<DropInfo>,
}

/// Statistics for a single block section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionStats {
    pub name: String,
    pub chars: usize,
    pub items_included: usize,
    pub items_total: usize,
}

/// Items dropped from a section during budget enforcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropInfo {
    pub section: String,
    pub items_dropped: usize,
    pub chars_dropped: usize,
    pub reason: String,
}

/// The assembler. Stateless apart from its budget; create one and reuse it.
pub struct ContextAssembler {
    budget: usize,
}

impl ContextAssembler {
    /// `budget` is measured in Unicode scalar values (`char`s), the one
    /// length unit used across the system.
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Assemble the context block.
    ///
    /// `retrieved` must be ordered by descending score (as the retrieval
    /// engine returns it); `memory` is in storage order, oldest first.
    pub fn assemble(
        &self,
        query: &str,
        retrieved: &[RetrievalResult],
        memory: &[Turn],
    ) -> AssembledContext {
        let sections = Sections {
            query: format!("Question: {query}"),
            top: retrieved.first().map(|r| reference_line(1, r)),
            // Newest first, so keeping a prefix keeps the most recent turns
            turn_lines: memory.iter().rev().map(Turn::render).collect(),
            chunk_lines: retrieved
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, r)| reference_line(i + 1, r))
                .collect(),
        };

        let mut turns_kept = sections.turn_lines.len();
        let mut chunks_kept = sections.chunk_lines.len();

        loop {
            let prompt = sections.render(turns_kept, chunks_kept);
            if char_len(&prompt) <= self.budget {
                return self.finalize(prompt, &sections, turns_kept, chunks_kept);
            }
            if turns_kept > 0 {
                turns_kept -= 1;
            } else if chunks_kept > 0 {
                chunks_kept -= 1;
            } else {
                return self.truncate_floor(&sections);
            }
        }
    }

    fn finalize(
        &self,
        prompt: String,
        sections: &Sections,
        turns_kept: usize,
        chunks_kept: usize,
    ) -> AssembledContext {
        let per_section = vec![
            SectionStats {
                name: "question".into(),
                chars: char_len(&sections.query),
                items_included: 1,
                items_total: 1,
            },
            SectionStats {
                name: "top_reference".into(),
                chars: sections.top.as_deref().map(char_len).unwrap_or(0),
                items_included: usize::from(sections.top.is_some()),
                items_total: usize::from(sections.top.is_some()),
            },
            SectionStats {
                name: "conversation".into(),
                chars: line_chars(&sections.turn_lines[..turns_kept]),
                items_included: turns_kept,
                items_total: sections.turn_lines.len(),
            },
            SectionStats {
                name: "references".into(),
                chars: line_chars(&sections.chunk_lines[..chunks_kept]),
                items_included: chunks_kept,
                items_total: sections.chunk_lines.len(),
            },
        ];

        let mut drops = Vec::new();
        if turns_kept < sections.turn_lines.len() {
            drops.push(DropInfo {
                section: "conversation".into(),
                items_dropped: sections.turn_lines.len() - turns_kept,
                chars_dropped: line_chars(&sections.turn_lines[turns_kept..]),
                reason: "Oldest turns dropped".into(),
            });
        }
        if chunks_kept < sections.chunk_lines.len() {
            drops.push(DropInfo {
                section: "references".into(),
                items_dropped: sections.chunk_lines.len() - chunks_kept,
                chars_dropped: line_chars(&sections.chunk_lines[chunks_kept..]),
                reason: "Lowest-scoring references dropped".into(),
            });
        }

        AssembledContext {
            metadata: AssemblyMetadata {
                total_chars: char_len(&prompt),
                budget: self.budget,
                per_section,
                drops,
            },
            prompt,
        }
    }

    /// Everything droppable is gone and the floor still does not fit.
    /// Truncating the combined floor from the end removes the reference
    /// text first and the question's tail only after it.
    fn truncate_floor(&self, sections: &Sections) -> AssembledContext {
        let floor = match &sections.top {
            Some(top) => format!("{}\n\n{top}", sections.query),
            None => sections.query.clone(),
        };
        let floor_chars = char_len(&floor);
        let prompt: String = floor.chars().take(self.budget).collect();

        let question_chars = char_len(&sections.query).min(self.budget);
        let per_section = vec![
            SectionStats {
                name: "question".into(),
                chars: question_chars,
                items_included: 1,
                items_total: 1,
            },
            SectionStats {
                name: "top_reference".into(),
                chars: char_len(&prompt).saturating_sub(question_chars),
                items_included: usize::from(sections.top.is_some()),
                items_total: usize::from(sections.top.is_some()),
            },
        ];

        let mut drops = vec![DropInfo {
            section: "top_reference".into(),
            items_dropped: 0,
            chars_dropped: floor_chars - char_len(&prompt),
            reason: "Hard floor truncated to fit the budget".into(),
        }];
        if !sections.turn_lines.is_empty() {
            drops.push(DropInfo {
                section: "conversation".into(),
                items_dropped: sections.turn_lines.len(),
                chars_dropped: line_chars(&sections.turn_lines),
                reason: "Oldest turns dropped".into(),
            });
        }
        if !sections.chunk_lines.is_empty() {
            drops.push(DropInfo {
                section: "references".into(),
                items_dropped: sections.chunk_lines.len(),
                chars_dropped: line_chars(&sections.chunk_lines),
                reason: "Lowest-scoring references dropped".into(),
            });
        }

        AssembledContext {
            metadata: AssemblyMetadata {
                total_chars: char_len(&prompt),
                budget: self.budget,
                per_section,
                drops,
            },
            prompt,
        }
    }
}

/// The candidate content for one assembly, pre-rendered per item.
struct Sections {
    query: String,
    top: Option<String>,
    turn_lines: Vec<String>,
    chunk_lines: Vec<String>,
}

impl Sections {
    /// Render with the newest `turns_kept` turns and the top-scoring
    /// `chunks_kept` extra references.
    fn render(&self, turns_kept: usize, chunks_kept: usize) -> String {
        let mut sections: Vec<String> = vec![self.query.clone()];
        if let Some(top) = &self.top {
            sections.push(top.clone());
        }
        if turns_kept > 0 {
            sections.push(format!(
                "[Conversation]\n{}",
                self.turn_lines[..turns_kept].join("\n")
            ));
        }
        if chunks_kept > 0 {
            sections.push(self.chunk_lines[..chunks_kept].join("\n"));
        }
        sections.join("\n\n")
    }
}

fn reference_line(position: usize, result: &RetrievalResult) -> String {
    format!(
        "[Reference {position}: {}] {}",
        result.chunk.metadata.document_id, result.chunk.text
    )
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn line_chars(lines: &[String]) -> usize {
    lines.iter().map(|l| char_len(l)).sum()
}
