//! Prompt construction for the description generator.

use crate::entry::{language_name, Category, DescriptionKind, ENGLISH};

const FINNISH: &str = "fi";

fn quoted_name(name: &str) -> String {
    name.replace('\'', "\\'")
}

fn bundle_clause(bundle_id: Option<&str>) -> String {
    bundle_id
        .map(|id| format!(" (bundle id: {id})"))
        .unwrap_or_default()
}

fn in_language(language: &str) -> String {
    if language == ENGLISH {
        String::new()
    } else {
        format!(" in {}", language_name(language))
    }
}

/// Prompt for one half of a language's description pair.
#[must_use]
pub fn description_prompt(
    name: &str,
    bundle_id: Option<&str>,
    kind: DescriptionKind,
    language: &str,
) -> String {
    let name = quoted_name(name);
    let bundle = bundle_clause(bundle_id);
    let lang = in_language(language);

    match kind {
        DescriptionKind::Short => {
            let example = if language == FINNISH {
                "Muokkaa kuvia, retusoi, rajaa, säädä värejä"
            } else {
                "Edit photos, retouch, crop, adjust colors"
            };
            format!(
                "Write a brief description (5-10 words){lang} of the Mac application '{name}'{bundle}. \
                 Focus on ACTION VERBS - what can user DO with this app. \
                 Reply ONLY with the description{lang}, nothing else. Example: '{example}'"
            )
        }
        DescriptionKind::Expanded => {
            let (verbs, reply, example) = if language == FINNISH {
                (
                    "- kirjoita, muokkaa, luo, suunnittele, piirrä, luonnostele\n\
                     - laske, analysoi, taulukoi, kaavio, graafi\n\
                     - tallenna, jaa, lähetä, synkronoi, varmuuskopioi\n\
                     - etsi, selaa, järjestä, hallitse, organisoi\n\
                     - toista, nauhoita, miksaa, editoi, leikkaa",
                    "Reply ONLY with the description in Finnish. Use ALL 255 characters.",
                    "Muokkaa kuvia, retusoi valokuvia, rajaa, säädä värejä, lisää suodattimia, \
                     poista taustoja, yhdistä tasoja, luo kollaaseja, piirrä, maalaa digitaalista \
                     taidetta, suunnittele grafiikoita, vie eri formaatteihin",
                )
            } else {
                (
                    "- write, edit, create, design, draw, sketch\n\
                     - calculate, analyze, spreadsheet, chart, graph\n\
                     - save, share, send, sync, backup\n\
                     - search, browse, organize, manage, sort\n\
                     - play, record, mix, edit, cut",
                    "Reply ONLY with the description in English. Use ALL 255 characters.",
                    "Edit photos, retouch images, crop, adjust colors, add filters, remove \
                     backgrounds, merge layers, create collages, draw, paint digital art, design \
                     graphics, export to various formats, batch process",
                )
            };
            format!(
                "Write a searchable description (use ALL 255 characters){lang} of the Mac application '{name}'{bundle}.\n\n\
                 CRITICAL: Focus on ACTION VERBS - what can user DO with this app!\n\
                 The user knows what they want to DO, not the app name.\n\n\
                 Include many verbs like:\n{verbs}\n\n{reply}\nExample: '{example}'"
            )
        }
    }
}

/// Prompt asking for exactly one label from the closed category set.
#[must_use]
pub fn category_prompt(name: &str, bundle_id: Option<&str>) -> String {
    let choices: Vec<String> = Category::ALL
        .iter()
        .map(|c| format!("- {} ({})", c.label(), c.hint()))
        .collect();
    format!(
        "Categorize the Mac application '{}'{} into ONE of these categories:\n{}\n\n\
         Reply with ONLY the category name, nothing else. Example: \"Development\"",
        quoted_name(name),
        bundle_clause(bundle_id),
        choices.join("\n")
    )
}

/// Prompt asking for a newline-delimited list of verb-first actions.
#[must_use]
pub fn functions_prompt(name: &str, bundle_id: Option<&str>, language: &str) -> String {
    let (examples, reply_language) = if language == FINNISH {
        (
            "muokkaa kuvia\nrajaa valokuvia\nsäädä värejä\npoista taustoja\nlisää suodattimia",
            "Finnish",
        )
    } else {
        (
            "edit images\ncrop photos\nadjust colors\nremove backgrounds\nadd filters",
            "English",
        )
    };
    format!(
        "List the main ACTIONS/FUNCTIONS a user can do with the Mac application '{}'{}{}.\n\n\
         Format: One action per line, starting with a verb. Keep each action 2-4 words.\n\
         List 5-15 actions, most important first.\n\n\
         Examples:\n{}\n\nReply ONLY with the list in {}, one per line.",
        quoted_name(name),
        bundle_clause(bundle_id),
        in_language(language),
        examples,
        reply_language
    )
}
