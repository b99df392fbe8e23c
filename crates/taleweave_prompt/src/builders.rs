//! Prompt assembly.
//!
//! Builders are deterministic: the same configuration and payload always
//! produce the same messages. Output-schema reminders live next to the prompt
//! that promises them so the two cannot drift apart.

use std::fmt::Write as _;
use taleweave_core::{BookConfig, ChatMessage, Page, Plan, Point};

const STRICT_JSON: &str = "Return strictly a single JSON object. No markdown, no commentary.";

const GENERATOR_STYLE: &str = "\
You are the narrator of an interactive serial novel.
Write lean prose in short paragraphs. Hold one point of view per page.
Let dialogue carry tension; keep attributions plain. Use figurative language
sparingly, one image per page at most. Never address the reader, never
mention plans, chapters, or choices inside the passage.";

fn config_block(config: &BookConfig) -> String {
    let mut block = String::from("Story configuration:\n");
    let _ = writeln!(block, "- In the spirit of: {} and {}", config.title_a, config.title_b);
    let _ = writeln!(block, "- World: {}", config.world);
    let _ = writeln!(block, "- Main character: {}", config.main_character);
    let _ = writeln!(block, "- Genre: {}", config.genre);
    block
}

/// Messages asking the planner for idea, conflict, and 6-9 major points.
pub fn planner_messages(config: &BookConfig) -> Vec<ChatMessage> {
    let system = "You are a story planner for an interactive serial novel. \
        Produce a complete outline a narrator can dramatize one page at a time."
        .to_string();
    let user = format!(
        "{}\nDraft the outline: a one-paragraph overall idea, the central \
         conflict, and 6 to 9 major plot points in order. Each point needs a \
         short title and a one-or-two-sentence brief.\n\
         Output schema: {{\"overallIdea\": string, \"conflict\": string, \
         \"points\": [{{\"title\": string, \"brief\": string}}]}}\n{}",
        config_block(config),
        STRICT_JSON
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn points_block(points: &[Point], with_substeps: bool) -> String {
    let mut block = String::new();
    for (index, point) in points.iter().enumerate() {
        let _ = writeln!(block, "{index}. {}: {}", point.title, point.brief);
        if with_substeps {
            for sub in &point.substeps {
                let _ = writeln!(block, "   - {sub}");
            }
        }
    }
    block
}

/// Messages asking for 3-6 dramatization sub-steps per point, one batched call.
pub fn substep_messages(config: &BookConfig, points: &[Point]) -> Vec<ChatMessage> {
    let system = "You break plot points into concrete dramatization sub-steps \
        for a page-at-a-time narrator."
        .to_string();
    let user = format!(
        "{}\nPlot points:\n{}\nFor every point, list 3 to 6 sub-steps. A \
         sub-step is one concrete dramatizable beat, a single sentence.\n\
         Output schema: {{\"items\": [{{\"index\": integer, \"substeps\": \
         [string]}}]}} where index refers to the numbering above.\n{}",
        config_block(config),
        points_block(points, false),
        STRICT_JSON
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for minimal introduction sub-steps where needed.
///
/// The reply only needs to carry points that change; untouched points may be
/// omitted entirely.
pub fn intro_insert_messages(config: &BookConfig, points: &[Point]) -> Vec<ChatMessage> {
    let system = "You audit a story outline for characters, items, or concepts \
        that are relied on before the reader could know them."
        .to_string();
    let user = format!(
        "{}\nOutline with sub-steps:\n{}\nWhere a sub-step relies on a \
         character, item, or concept that has not been introduced, insert a \
         minimal introduction sub-step before the first reliance. Keep every \
         list at 7 sub-steps or fewer. Reply only with the points you \
         changed, carrying their full revised sub-step lists.\n\
         Output schema: {{\"items\": [{{\"index\": integer, \"substeps\": \
         [string]}}]}} where index refers to the numbering above.\n{}",
        config_block(config),
        points_block(points, true),
        STRICT_JSON
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Per-turn focus the generator selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Focus {
    /// Dramatize a specific plan sub-step
    Substep {
        /// The sub-step text to dramatize
        text: String,
        /// Next major point, attached in transition windows
        buildup: Option<Point>,
    },
    /// Deepen the world
    World,
    /// Deepen a character
    Character,
}

impl Focus {
    fn directive(&self) -> String {
        match self {
            Focus::Substep { text, buildup } => {
                let mut directive = format!(
                    "Focus for this page: dramatize this planned beat without \
                     naming it as such: {text}"
                );
                if let Some(point) = buildup {
                    let _ = write!(
                        directive,
                        "\nThe story is approaching its next movement: {} ({}). \
                         Let the page build toward it. Do not reveal or \
                         summarize the planning.",
                        point.title, point.brief
                    );
                }
                directive
            }
            Focus::World => "Focus for this page: deepen the world. Surface a \
                texture, custom, or place that makes the setting feel lived-in, \
                woven into the ongoing action."
                .to_string(),
            Focus::Character => "Focus for this page: deepen a character. Let a \
                want, fear, or habit surface through behavior, not exposition."
                .to_string(),
        }
    }
}

/// Payload for one page-generation prompt.
#[derive(Debug, Clone)]
pub struct PagePrompt<'a> {
    /// Authoring configuration
    pub config: &'a BookConfig,
    /// Focus the generator selected for this turn
    pub focus: Focus,
    /// Whether the model may offer choices
    pub allow_options: bool,
    /// Previous committed summary, if any
    pub summary: Option<&'a str>,
    /// Memory notes, passed through verbatim
    pub notes: &'a [String],
    /// Up to the last three passages preceding the generation point
    pub recent_passages: Vec<&'a str>,
    /// The player's choice driving this page, if any
    pub next_choice: Option<&'a str>,
}

/// Messages for one page generation.
pub fn page_messages(prompt: &PagePrompt<'_>) -> Vec<ChatMessage> {
    let options_directive = if prompt.allow_options {
        "You MAY end the page at a decision moment. If you do, include an \
         \"options\" field with exactly three short choice strings; otherwise \
         omit the field."
    } else {
        "Do NOT include an \"options\" field."
    };
    let system = format!(
        "{GENERATOR_STYLE}\n\n{}\n\n{}\n\nOutput schema: {{\"passage\": string \
         (6-8 short paragraphs), \"summary\": string (one line), \"notes\": \
         [string] (at most 2 new factual bullets worth remembering), \
         \"options\"?: [string, string, string]}}",
        prompt.focus.directive(),
        options_directive
    );

    let mut user = config_block(prompt.config);
    if let Some(summary) = prompt.summary {
        let _ = writeln!(user, "\nStory so far: {summary}");
    }
    if !prompt.notes.is_empty() {
        user.push_str("\nMemory notes:\n");
        for note in prompt.notes {
            let _ = writeln!(user, "- {note}");
        }
    }
    if !prompt.recent_passages.is_empty() {
        user.push_str("\nMost recent pages:\n");
        for passage in &prompt.recent_passages {
            let _ = writeln!(user, "---\n{passage}");
        }
    }
    if let Some(choice) = prompt.next_choice {
        let _ = writeln!(user, "\nThe reader chose: {choice}\nContinue from that choice.");
    }
    user.push('\n');
    user.push_str(STRICT_JSON);

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking whether a committed passage accomplished a sub-step.
pub fn verifier_messages(
    passage: &str,
    sub_text: &str,
    recent_passages: &[&str],
    notes: &[String],
) -> Vec<ChatMessage> {
    let system = "You check whether a narrative beat was dramatized. Err on \
        the side of done: partial but recognizable accomplishment counts."
        .to_string();
    let mut user = String::new();
    if !recent_passages.is_empty() {
        user.push_str("Recent pages for context:\n");
        for p in recent_passages {
            let _ = writeln!(user, "---\n{p}");
        }
    }
    if !notes.is_empty() {
        user.push_str("Memory notes:\n");
        for note in notes {
            let _ = writeln!(user, "- {note}");
        }
    }
    let _ = writeln!(
        user,
        "\nPlanned beat: {sub_text}\n\nPassage just committed:\n{passage}\n\n\
         Did the passage accomplish the planned beat?\n\
         Output schema: {{\"done\": boolean}}\n{STRICT_JSON}"
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for a revised plan after a reader choice.
pub fn adapt_messages(
    config: &BookConfig,
    plan: &Plan,
    committed_page: &Page,
    choice: &str,
) -> Vec<ChatMessage> {
    let system = "You revise a story outline so it stays coherent after a \
        reader's choice changed the story's direction. Preserve continuity \
        with everything already dramatized."
        .to_string();
    let user = format!(
        "{}\nCurrent outline (idea: {}; conflict: {}):\n{}\nCursor: point {}, \
         sub-step {}.\n\nThe reader chose: {}\nThe page that resulted:\n{}\n\n\
         Produce the full revised outline: overall idea, conflict, at least 3 \
         points each with title, brief, and 1-7 sub-steps, plus the cursor \
         position of the next unperformed sub-step in the revised outline.\n\
         Output schema: {{\"overallIdea\": string, \"conflict\": string, \
         \"points\": [{{\"title\": string, \"brief\": string, \"substeps\": \
         [string]}}], \"curPoint\": integer, \"curSub\": integer}}\n{}",
        config_block(config),
        plan.overall_idea,
        plan.conflict,
        points_block(&plan.points, true),
        plan.cur_point,
        plan.cur_sub,
        choice,
        committed_page.passage,
        STRICT_JSON
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
