use indexmap::IndexSet;

use crate::cloze::ClozeResolution;
use crate::quiz::{Card, Cloze, ClozeSubkind, Quiz};

/// Joins multiple responses when they become the prompt of an inverted card.
pub const RESPONSE_SEPARATOR: &str = "・";

/// The three review directions for one prompt/response pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTriple {
    pub passive: Card,
    pub see_prompt: Option<Card>,
    pub see_response: Option<Card>,
}

impl CardTriple {
    /// `[passive, see_prompt, see_response]`, absent directions as `None`.
    pub fn slots(&self) -> [Option<&Card>; 3] {
        [Some(&self.passive), self.see_prompt.as_ref(), self.see_response.as_ref()]
    }

    /// Like [`CardTriple::slots`], as owned graph nodes.
    pub fn quiz_slots(&self) -> [Option<Quiz>; 3] {
        self.slots().map(|card| card.cloned().map(Quiz::Card))
    }

    pub fn cards_mut(&mut self) -> impl Iterator<Item = &mut Card> {
        std::iter::once(&mut self.passive)
            .chain(self.see_prompt.as_mut())
            .chain(self.see_response.as_mut())
    }

    /// True when prompt and response coincide, so only the passive card exists.
    pub fn is_trivial(&self) -> bool {
        self.see_prompt.is_none() && self.see_response.is_none()
    }
}

/// Build the passive card and, unless the pair is trivial (a single
/// response equal to the prompt), the two active directions. An empty
/// `responses` is read as `[prompt]`.
pub fn build_card_triple(prompt: &str, responses: &[String]) -> CardTriple {
    let responses = if responses.is_empty() {
        vec![prompt.to_string()]
    } else {
        responses.to_vec()
    };

    let passive = Card::new(prompt, responses.clone(), true, false);
    if responses.len() == 1 && responses[0] == prompt {
        return CardTriple {
            passive,
            see_prompt: None,
            see_response: None,
        };
    }

    let see_prompt = Card::new(prompt, responses.clone(), false, false);
    let see_response = Card::new(
        responses.join(RESPONSE_SEPARATOR),
        vec![prompt.to_string()],
        false,
        true,
    );
    CardTriple {
        passive,
        see_prompt: Some(see_prompt),
        see_response: Some(see_response),
    }
}

/// Turn a resolved blank into a cloze whose single blank accepts `answers`
/// (duplicates dropped, first occurrence kept).
pub fn wrap_cloze(
    resolution: &ClozeResolution,
    subkind: ClozeSubkind,
    answers: impl IntoIterator<Item = String>,
    prompts: Option<Vec<String>>,
) -> Cloze {
    let answers: IndexSet<String> = answers.into_iter().collect();
    Cloze::new(
        resolution.contexts(),
        vec![answers.into_iter().collect()],
        prompts,
        subkind,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::cloze::parse_cloze;
    use crate::quiz::ClozeContext;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case::identical("湯婆婆", &["湯婆婆"], 1)]
    #[case::reading("千", &["せん"], 3)]
    #[case::several("私", &["わたし", "わたくし", "あたし"], 3)]
    #[case::prompt_among_several("私", &["私", "わたし"], 3)]
    #[case::empty("本", &[], 1)]
    fn triple_size(#[case] prompt: &str, #[case] responses: &[&str], #[case] expected: usize) {
        let triple = build_card_triple(prompt, &strings(responses));
        assert_eq!(triple.slots().iter().flatten().count(), expected);
        assert_eq!(triple.is_trivial(), expected == 1);
    }

    #[test]
    fn directions() {
        let triple = build_card_triple("私", &strings(&["わたし", "あたし"]));
        assert!(triple.passive.is_passive());
        assert!(!triple.passive.inverted);

        let see_prompt = triple.see_prompt.as_ref().unwrap();
        assert!(!see_prompt.is_passive());
        assert_eq!(see_prompt.prompt(), "私");
        assert_eq!(see_prompt.responses(), strings(&["わたし", "あたし"]));

        let see_response = triple.see_response.as_ref().unwrap();
        assert!(see_response.inverted);
        assert_eq!(see_response.prompt(), "わたし・あたし");
        assert_eq!(see_response.responses(), strings(&["私"]));

        let ids: IndexSet<_> = triple.slots().iter().flatten().map(|c| c.id().clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn cards_mut_visits_present_cards() {
        let mut triple = build_card_triple("千", &strings(&["せん"]));
        for card in triple.cards_mut() {
            card.part_of_speech = Some(strings(&["noun"]));
        }
        assert!(triple.slots().iter().flatten().all(|c| c.part_of_speech.is_some()));
    }

    #[test]
    fn wrap_cloze_dedups_answers() {
        let resolution = parse_cloze("千と千尋の神隠し", "の").unwrap();
        let cloze = wrap_cloze(
            &resolution,
            ClozeSubkind::Fill,
            strings(&["の", "no", "の"]),
            None,
        );
        assert_eq!(cloze.clozes(), &[strings(&["の", "no"])]);
        assert_eq!(
            cloze.contexts(),
            &[
                ClozeContext::Text("千と千尋".into()),
                ClozeContext::Blank,
                ClozeContext::Text("神隠し".into()),
            ]
        );
    }
}
