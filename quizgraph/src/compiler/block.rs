use std::iter;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::cloze::{ClozeResolution, parse_cloze};
use crate::error::{CompileError, CompileErrorKind};
use crate::furigana::{Furigana, furigana_text, linearize, parse_furigana};
use crate::graph::QuizGraph;
use crate::matrix::{MATCH_MATRIX, Matrix, SENTENCE_MATRIX, link};
use crate::parser::adverbs::{AtLine, separate_at_values};
use crate::parser::bullets::{BulletKind, classify, header_prefix};
use crate::parser::structural::{Block, Line};
use crate::quiz::factory::{RESPONSE_SEPARATOR, build_card_triple, wrap_cloze};
use crate::quiz::{Annotations, ClozeSubkind, Match, MatchPair, Quiz, QuizId, Translation};

/// Compile `block` into `graph`. Everything is built in a staging graph
/// first, so a failing block contributes nothing.
pub(super) fn compile(graph: &mut QuizGraph, block: &Block, file_id: usize) -> Result<(), CompileError> {
    let Some(header) = block.header() else {
        return Ok(());
    };
    let Some(prefix) = header_prefix(&header.text) else {
        trace!("skipping block without annotated header: `{}`", header.text);
        return Ok(());
    };

    let staged = BlockCompiler {
        graph: &*graph,
        header,
        file_id,
        staging: QuizGraph::new(),
    }
    .run(block, prefix)?;

    debug!(
        "compiled `{}`: {} node(s), {} edge(s)",
        header.text,
        staged.len(),
        staged.edge_count()
    );
    graph.merge_graph(staged);
    Ok(())
}

/// A recognized bullet line and the length of its marker prefix.
struct Bullet<'a> {
    kind: BulletKind,
    prefix: usize,
    line: &'a Line,
}

impl Bullet<'_> {
    fn fields(&self) -> AtLine {
        separate_at_values(&self.line.text, self.prefix)
    }

    fn rest(&self) -> &str {
        self.line.text[self.prefix..].trim()
    }
}

/// The header sentence, as every bullet of the block sees it.
struct Sentence {
    prompt: String,
    responses: Vec<String>,
    cards: [Option<Quiz>; 3],
    annotations: Annotations,
    /// Per-character readings, present only when the furigana spells out
    /// exactly the prompt.
    readings: Option<Vec<String>>,
}

impl Sentence {
    fn cards(&self) -> impl Iterator<Item = &Quiz> {
        self.cards.iter().flatten()
    }

    /// The reading of the blanked span, if the blank starts and ends on
    /// phonetic-unit boundaries.
    fn reading_of(&self, resolution: &ClozeResolution) -> Option<String> {
        let readings = self.readings.as_ref()?;
        let span = resolution.blank_chars();
        if span.end > readings.len() {
            return None;
        }
        let starts_unit = readings.get(span.start).is_some_and(|r| !r.is_empty());
        let ends_unit = readings.get(span.end).is_none_or(|r| !r.is_empty());
        (starts_unit && ends_unit).then(|| readings[span].concat())
    }
}

/// The cards and clozes one vocabulary bullet produced.
struct FlashGroup {
    cards: [Option<Quiz>; 3],
    clozes: [Option<Quiz>; 3],
}

struct BlockCompiler<'a> {
    /// The graph as it was before this block, for merged lookups.
    graph: &'a QuizGraph,
    header: &'a Line,
    file_id: usize,
    staging: QuizGraph,
}

impl<'a> BlockCompiler<'a> {
    fn run(mut self, block: &'a Block, prefix: usize) -> Result<QuizGraph, CompileError> {
        let header = self.header;
        let fields = separate_at_values(&header.text, prefix);
        let (prompt, rest) = fields.split_first();
        if prompt.is_empty() {
            return Err(self.error(CompileErrorKind::MissingPrompt, header));
        }
        let responses = if rest.is_empty() {
            vec![prompt.to_string()]
        } else {
            rest.to_vec()
        };

        let bullets: Vec<Bullet<'a>> = block
            .body()
            .iter()
            .map_while(|line| classify(&line.text).map(|(kind, prefix)| Bullet { kind, prefix, line }))
            .collect();

        let translation = short_translation(&fields.adverbs).or_else(|| {
            bullets
                .iter()
                .find(|b| b.kind == BulletKind::Translation)
                .and_then(|b| bullet_translation(&b.fields().adverbs))
        });
        let lede = bullets
            .iter()
            .find(|b| b.kind == BulletKind::Furigana)
            .map(|b| self.furigana(b.rest(), b.line))
            .transpose()?;
        let annotations = Annotations { translation, lede };

        let mut triple = build_card_triple(prompt, &responses);
        for card in triple.cards_mut() {
            card.annotations = annotations.clone();
        }
        let readings = annotations
            .lede
            .as_deref()
            .filter(|lede| furigana_text(lede) == prompt)
            .map(linearize);

        let sentence = Sentence {
            prompt: prompt.to_string(),
            responses,
            cards: triple.quiz_slots(),
            annotations,
            readings,
        };

        for card in sentence.cards() {
            self.staging.insert_with_raw(&header.text, card.clone());
        }
        // header-only blocks still need their intra-header edges
        self.link_sentence(&sentence, &[None, None, None], &[None, None, None], header)?;

        for bullet in bullets.iter().filter(|b| b.kind == BulletKind::Fill) {
            trace!("fill: {}", bullet.line.text);
            self.fill(&sentence, bullet)?;
        }

        let mut groups = Vec::new();
        for bullet in bullets.iter().filter(|b| b.kind == BulletKind::Flash) {
            trace!("vocabulary: {}", bullet.line.text);
            if let Some(group) = self.flash(&sentence, bullet)? {
                groups.push(group);
            }
        }

        self.matching(&sentence, &groups)?;
        Ok(self.staging)
    }

    /// A blank in the header sentence. Fill clozes and header cards credit
    /// each other both ways.
    fn fill(&mut self, sentence: &Sentence, bullet: &Bullet<'_>) -> Result<(), CompileError> {
        let fields = bullet.fields();
        let (locator, extras) = fields.split_first();
        if locator.is_empty() {
            return Err(self.malformed("fill bullet has no blank", bullet.line));
        }
        let resolution =
            parse_cloze(&sentence.prompt, locator).map_err(|e| self.error(e, bullet.line))?;

        let answers = iter::once(resolution.cloze.clone()).chain(extras.iter().cloned());
        let mut cloze = wrap_cloze(&resolution, ClozeSubkind::Fill, answers, None);
        cloze.annotations = sentence.annotations.clone();
        let node = Quiz::Cloze(cloze);

        self.staging
            .insert_with_raw(&raw_key(self.header, bullet.line), node.clone());
        for card in sentence.cards() {
            self.staging.add_edge(card, &node);
            self.staging.add_edge(&node, card);
        }
        Ok(())
    }

    /// A vocabulary span of the header sentence: its own cards, up to three
    /// clozes blanking it out of the sentence, all linked to the header.
    fn flash(
        &mut self,
        sentence: &Sentence,
        bullet: &Bullet<'_>,
    ) -> Result<Option<FlashGroup>, CompileError> {
        let fields = bullet.fields();
        let (prompt, rest) = fields.split_first();
        if prompt.is_empty() {
            return Err(self.malformed("vocabulary bullet has no prompt", bullet.line));
        }
        let responses = if rest.is_empty() {
            vec![prompt.to_string()]
        } else {
            rest.to_vec()
        };

        let mut triple = build_card_triple(prompt, &responses);
        let lede = fields
            .adverb("furigana")
            .map(|text| self.furigana(text, bullet.line))
            .transpose()?;
        let part_of_speech = fields.adverb("pos").map(split_part_of_speech);
        for card in triple.cards_mut() {
            card.annotations.lede = lede.clone();
            card.part_of_speech = part_of_speech.clone();
        }

        if prompt == sentence.prompt && responses == sentence.responses {
            self.merge_header_part_of_speech(sentence, part_of_speech);
            return Ok(None);
        }

        if let Some(translation) = short_translation(&fields.adverbs) {
            for card in triple.cards_mut() {
                card.annotations.translation = Some(translation.clone());
            }
        }

        let raw = raw_key(self.header, bullet.line);
        let cards = triple.quiz_slots();
        for card in cards.iter().flatten() {
            self.staging.insert_with_raw(&raw, card.clone());
        }

        let blank = fields
            .adverb("omit")
            .filter(|omit| !omit.is_empty())
            .or_else(|| sentence.prompt.contains(prompt).then_some(prompt));
        let clozes = match blank {
            Some(blank) => {
                let resolution =
                    parse_cloze(&sentence.prompt, blank).map_err(|e| self.error(e, bullet.line))?;
                vocabulary_clozes(sentence, &resolution, prompt, &responses, triple.is_trivial())
            }
            None => [None, None, None],
        };
        for cloze in clozes.iter().flatten() {
            self.staging.insert_with_raw(&raw, cloze.clone());
        }

        self.link_sentence(sentence, &cards, &clozes, bullet.line)?;
        Ok(Some(FlashGroup { cards, clozes }))
    }

    /// A vocabulary bullet repeating the header only contributes its part of
    /// speech, and only if the header has none yet.
    fn merge_header_part_of_speech(&mut self, sentence: &Sentence, part_of_speech: Option<Vec<String>>) {
        let Some(part_of_speech) = part_of_speech else {
            return;
        };
        let Some(passive) = sentence.cards[0].as_ref() else {
            return;
        };
        let known = self
            .lookup(passive.id())
            .filter_map(Quiz::as_card)
            .any(|card| card.part_of_speech.is_some());
        if known {
            return;
        }

        for card in sentence.cards() {
            if let Quiz::Card(mut card) = card.clone() {
                card.part_of_speech = Some(part_of_speech.clone());
                self.staging.insert_with_raw(&self.header.text, Quiz::Card(card));
            }
        }
    }

    /// One matching quiz pairing the reading and translation of every
    /// vocabulary item whose own bullet gives both.
    fn matching(&mut self, sentence: &Sentence, groups: &[FlashGroup]) -> Result<(), CompileError> {
        let pairs: Vec<MatchPair> = groups
            .iter()
            .filter_map(|group| group.cards[0].as_ref())
            .filter_map(|passive| {
                let annotations = passive.annotations();
                Some(MatchPair {
                    text: annotations.lede.clone()?,
                    translation: annotations.translation.clone()?,
                })
            })
            .collect();
        if pairs.is_empty() {
            return Ok(());
        }

        let header = self.header;
        let quiz = Quiz::Match(Match::new(pairs, sentence.annotations.clone()));
        self.staging.insert_with_raw(&header.text, quiz.clone());

        for group in groups {
            let slots: Vec<Option<&Quiz>> = sentence
                .cards
                .iter()
                .chain(&group.cards)
                .chain(&group.clozes)
                .map(Option::as_ref)
                .chain(iter::once(Some(&quiz)))
                .collect();
            self.link_group(&MATCH_MATRIX, &slots, header)?;
        }
        Ok(())
    }

    fn link_sentence(
        &mut self,
        sentence: &Sentence,
        cards: &[Option<Quiz>; 3],
        clozes: &[Option<Quiz>; 3],
        line: &Line,
    ) -> Result<(), CompileError> {
        let slots: Vec<Option<&Quiz>> = sentence
            .cards
            .iter()
            .chain(cards)
            .chain(clozes)
            .map(Option::as_ref)
            .collect();
        self.link_group(&SENTENCE_MATRIX, &slots, line)
    }

    fn link_group(&mut self, matrix: &Matrix, slots: &[Option<&Quiz>], line: &Line) -> Result<(), CompileError> {
        link(&mut self.staging, matrix, slots).map_err(|kind| CompileError::new(kind, line, self.file_id))
    }

    /// A node as this block has built it so far, then as earlier blocks left it.
    fn lookup(&self, id: &QuizId) -> impl Iterator<Item = &Quiz> {
        self.staging.get(id).into_iter().chain(self.graph.get(id))
    }

    fn furigana(&self, text: &str, line: &Line) -> Result<Vec<Furigana>, CompileError> {
        parse_furigana(text)
            .map_err(|e| self.error(CompileErrorKind::MalformedBullet(format!("bad furigana: {}", e)), line))
    }

    fn malformed(&self, reason: &str, line: &Line) -> CompileError {
        self.error(CompileErrorKind::MalformedBullet(reason.to_string()), line)
    }

    fn error(&self, kind: impl Into<CompileErrorKind>, line: &Line) -> CompileError {
        CompileError::new(kind, line, self.file_id)
    }
}

/// The see-nothing, see-prompt and see-response clozes for a vocabulary
/// blank. Trivial vocabulary (prompt equals its only response) gets only
/// the see-nothing one.
fn vocabulary_clozes(
    sentence: &Sentence,
    resolution: &ClozeResolution,
    prompt: &str,
    responses: &[String],
    trivial: bool,
) -> [Option<Quiz>; 3] {
    let either_side = || responses.iter().cloned().chain(iter::once(prompt.to_string()));

    let see_nothing = wrap_cloze(
        resolution,
        ClozeSubkind::SeeNothing,
        either_side().chain(sentence.reading_of(resolution)),
        None,
    );
    let (see_prompt, see_response) = if trivial {
        (None, None)
    } else {
        (
            Some(wrap_cloze(
                resolution,
                ClozeSubkind::SeePrompt,
                either_side(),
                Some(vec![prompt.to_string()]),
            )),
            Some(wrap_cloze(
                resolution,
                ClozeSubkind::SeeResponse,
                iter::once(prompt.to_string()),
                Some(vec![responses.join(RESPONSE_SEPARATOR)]),
            )),
        )
    };

    [Some(see_nothing), see_prompt, see_response].map(|cloze| {
        cloze.map(|mut cloze| {
            cloze.annotations = sentence.annotations.clone();
            Quiz::Cloze(cloze)
        })
    })
}

/// `@t-<lang>` markers.
fn short_translation(adverbs: &IndexMap<String, String>) -> Option<Translation> {
    let translation: Translation = adverbs
        .iter()
        .filter_map(|(name, text)| Some((name.strip_prefix("t-")?.to_string(), text.clone())))
        .collect();
    (!translation.is_empty()).then_some(translation)
}

/// Every marker of a `@translation` bullet; the `t-` prefix is optional.
fn bullet_translation(adverbs: &IndexMap<String, String>) -> Option<Translation> {
    let translation: Translation = adverbs
        .iter()
        .map(|(name, text)| (name.strip_prefix("t-").unwrap_or(name).to_string(), text.clone()))
        .collect();
    (!translation.is_empty()).then_some(translation)
}

fn split_part_of_speech(pos: &str) -> Vec<String> {
    pos.split('-').map(String::from).collect()
}

fn raw_key(header: &Line, line: &Line) -> String {
    format!("{}\n{}", header.text, line.text)
}
