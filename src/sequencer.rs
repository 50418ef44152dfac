// Phase sequencer: walks the planned timeline one phase at a time.
// The host owns the clock. Every scheduled timer carries the run token it was issued
// for; a timer whose token no longer matches the active run is ignored.

use serde::{Deserialize, Serialize};

use crate::cues::{speech_text, Cues, SoundCue};
use crate::timeline::{plan, AnimationPhase, LayerVisibility, PhaseStep, TimelineConfig};
use crate::types::{GachaResult, ResultEnding};

/// Identifies one run of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunToken(u64);

impl RunToken {
    pub fn from_raw(raw: u64) -> Self {
        RunToken(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Ask the host to call `on_timer(token)` after `delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerRequest {
    pub token: RunToken,
    pub delay_ms: u32,
}

/// What the sequencer did in response to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advance {
    /// Entered or continued a phase; schedule the next tick.
    Scheduled { timer: TimerRequest },
    /// Holding at the result card until `complete()`.
    AwaitingAction,
    /// Timeline finished, back to idle.
    Completed,
    /// Timer belonged to a run that no longer exists.
    Stale,
}

struct Run {
    token: RunToken,
    result: GachaResult,
    steps: Vec<PhaseStep>,
    cursor: usize,
    /// Serif line currently on screen.
    serif_line: usize,
}

impl Run {
    fn step(&self) -> PhaseStep {
        self.steps[self.cursor]
    }

    fn serif_count(&self) -> usize {
        self.result.character.serifs.len()
    }
}

/// Drives the summon timeline and fires cues on phase entry.
pub struct Sequencer<C: Cues> {
    cues: C,
    config: TimelineConfig,
    ending: ResultEnding,
    run: Option<Run>,
    next_token: u64,
}

impl<C: Cues> Sequencer<C> {
    pub fn new(cues: C, config: TimelineConfig, ending: ResultEnding) -> Self {
        Sequencer {
            cues,
            config,
            ending,
            run: None,
            next_token: 1,
        }
    }

    pub fn cues(&self) -> &C {
        &self.cues
    }

    pub fn cues_mut(&mut self) -> &mut C {
        &mut self.cues
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn phase(&self) -> AnimationPhase {
        self.run
            .as_ref()
            .map(|run| run.step().phase)
            .unwrap_or(AnimationPhase::Idle)
    }

    pub fn layers(&self) -> LayerVisibility {
        LayerVisibility::for_phase(self.phase(), self.ending)
    }

    pub fn result(&self) -> Option<&GachaResult> {
        self.run.as_ref().map(|run| &run.result)
    }

    /// Index of the serif line on screen, while the serif layer is visible.
    pub fn current_serif(&self) -> Option<usize> {
        let run = self.run.as_ref()?;
        if !self.layers().serif || run.serif_count() == 0 {
            return None;
        }
        Some(run.serif_line.min(run.serif_count() - 1))
    }

    /// Begin a new run. A run already in progress is abandoned first.
    pub fn start(&mut self, result: GachaResult) -> Advance {
        if let Some(old) = self.run.take() {
            log::info!(
                "Superseding run {} at {:?}",
                old.token.as_raw(),
                old.step().phase
            );
        }

        let token = RunToken(self.next_token);
        self.next_token += 1;

        let steps = plan(
            &self.config,
            result.character.rarity,
            result.character.serifs.len(),
            self.ending,
        );

        log::debug!(
            "Run {} starting for {} '{}' ({} phases)",
            token.as_raw(),
            result.character.rarity,
            result.character.name,
            steps.len()
        );

        self.run = Some(Run {
            token,
            result,
            steps,
            cursor: 0,
            serif_line: 0,
        });
        self.enter()
    }

    /// A host timer fired.
    pub fn on_timer(&mut self, token: RunToken) -> Advance {
        let Some(run) = self.run.as_mut() else {
            log::debug!("Timer {} fired while idle", token.as_raw());
            return Advance::Stale;
        };
        if run.token != token {
            log::debug!(
                "Ignoring stale timer {} (active run {})",
                token.as_raw(),
                run.token.as_raw()
            );
            return Advance::Stale;
        }

        if run.step().phase == AnimationPhase::Serif && run.serif_line + 1 < run.serif_count() {
            run.serif_line += 1;
            return self.show_serif_line();
        }

        run.cursor += 1;
        if run.cursor >= run.steps.len() {
            log::debug!("Run {} completed", token.as_raw());
            self.run = None;
            return Advance::Completed;
        }
        self.enter()
    }

    /// Release the result card. Ignored outside the result phase.
    pub fn complete(&mut self) -> bool {
        if self.phase() != AnimationPhase::ResultCard {
            return false;
        }
        if let Some(run) = self.run.take() {
            log::debug!("Run {} completed from result", run.token.as_raw());
        }
        true
    }

    /// Drop the active run immediately. Pending timers become stale.
    pub fn cancel(&mut self) {
        if let Some(run) = self.run.take() {
            log::info!(
                "Cancelled run {} at {:?}",
                run.token.as_raw(),
                run.step().phase
            );
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.cues.set_muted(muted);
    }

    fn enter(&mut self) -> Advance {
        let Some(run) = self.run.as_mut() else {
            return Advance::Completed;
        };
        let step = run.step();
        let rarity = run.result.character.rarity;
        log::debug!("Run {} -> {:?}", run.token.as_raw(), step.phase);

        match step.phase {
            AnimationPhase::Shatter => self.cues.play(SoundCue::Roll),
            AnimationPhase::Effect => self.cues.play(SoundCue::RarityGet(rarity)),
            AnimationPhase::NameReveal => self.cues.play(SoundCue::Cutin),
            AnimationPhase::Serif => {
                run.serif_line = 0;
                return self.show_serif_line();
            }
            _ => {}
        }

        let token = run.token;
        match step.duration_ms {
            Some(delay_ms) => Advance::Scheduled {
                timer: TimerRequest { token, delay_ms },
            },
            None => Advance::AwaitingAction,
        }
    }

    /// Show and speak the current serif line, then hold it for its slot.
    /// The last slot also carries the buffer, so the phase totals `n * per_line + buffer`.
    fn show_serif_line(&mut self) -> Advance {
        let Some(run) = self.run.as_ref() else {
            return Advance::Completed;
        };
        let token = run.token;
        let count = run.serif_count();

        if count == 0 {
            return Advance::Scheduled {
                timer: TimerRequest {
                    token,
                    delay_ms: self.config.serif_buffer_ms,
                },
            };
        }

        let line = run.serif_line;
        let text = speech_text(&run.result.character.serifs[line]);
        self.cues.play(SoundCue::SerifAppear);
        if let Some(text) = text {
            self.cues.speak(&text);
        }

        let mut delay_ms = self.config.serif_per_line_ms;
        if line + 1 == count {
            delay_ms = delay_ms.saturating_add(self.config.serif_buffer_ms);
        }
        Advance::Scheduled {
            timer: TimerRequest { token, delay_ms },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cues::{CueBuffer, CueEvent};
    use crate::types::{Character, Rarity, Timestamp};

    fn result(rarity: Rarity, serifs: &[&str]) -> GachaResult {
        GachaResult {
            character: Character {
                id: "test".to_string(),
                name: "Tester".to_string(),
                rarity,
                serifs: serifs.iter().map(|s| s.to_string()).collect(),
                description: None,
            },
            timestamp: Timestamp::from_millis(0),
        }
    }

    fn sequencer(ending: ResultEnding) -> Sequencer<CueBuffer> {
        Sequencer::new(CueBuffer::new(), TimelineConfig::default(), ending)
    }

    fn timer(advance: Advance) -> TimerRequest {
        match advance {
            Advance::Scheduled { timer } => timer,
            other => panic!("expected a scheduled timer, got {:?}", other),
        }
    }

    /// Drive the run until it stops scheduling, recording each phase entered.
    fn run_to_end(seq: &mut Sequencer<CueBuffer>, first: Advance) -> (Vec<AnimationPhase>, Advance) {
        let mut seen = vec![seq.phase()];
        let mut advance = first;
        while let Advance::Scheduled { timer } = advance {
            advance = seq.on_timer(timer.token);
            if seq.phase() != *seen.last().unwrap() {
                seen.push(seq.phase());
            }
        }
        (seen, advance)
    }

    fn played(cues: &CueBuffer, cue: SoundCue) -> bool {
        cues.events()
            .iter()
            .any(|e| matches!(e, CueEvent::Play { cue: c, .. } if *c == cue))
    }

    #[test]
    fn ssr_run_includes_explosion_and_pauses_at_result() {
        let mut seq = sequencer(ResultEnding::Pause);
        let first = seq.start(result(Rarity::Ssr, &["a"]));
        let (phases, last) = run_to_end(&mut seq, first);

        assert_eq!(
            phases,
            vec![
                AnimationPhase::Shatter,
                AnimationPhase::Flash,
                AnimationPhase::Explosion,
                AnimationPhase::Effect,
                AnimationPhase::Serif,
                AnimationPhase::RarityBadge,
                AnimationPhase::NameReveal,
                AnimationPhase::ResultCard,
            ]
        );
        assert_eq!(last, Advance::AwaitingAction);
        assert!(seq.is_running());
        assert!(seq.layers().result_actions);

        assert!(seq.complete());
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        assert!(seq.result().is_none());
    }

    #[test]
    fn non_top_tier_goes_flash_to_effect() {
        let mut seq = sequencer(ResultEnding::Pause);
        let first = seq.start(result(Rarity::Sr, &["a"]));
        let (phases, _) = run_to_end(&mut seq, first);
        assert!(!phases.contains(&AnimationPhase::Explosion));
        let flash = phases
            .iter()
            .position(|p| *p == AnimationPhase::Flash)
            .unwrap();
        assert_eq!(phases[flash + 1], AnimationPhase::Effect);
    }

    #[test]
    fn auto_advance_fades_out_and_completes() {
        let mut seq = sequencer(ResultEnding::AutoAdvance);
        let first = seq.start(result(Rarity::N, &["a"]));
        let (phases, last) = run_to_end(&mut seq, first);

        assert_eq!(phases.last(), Some(&AnimationPhase::Idle));
        assert!(phases.contains(&AnimationPhase::Fadeout));
        assert_eq!(last, Advance::Completed);
        assert!(!seq.is_running());
    }

    #[test]
    fn serif_phase_totals_formula_and_speaks_each_line() {
        let config = TimelineConfig::default();
        for lines in [vec![], vec!["「one」"], vec!["1", "2", "3", "4", "5"]] {
            let mut seq = sequencer(ResultEnding::Pause);
            let mut advance = seq.start(result(Rarity::R, &lines));
            while seq.phase() != AnimationPhase::Serif {
                advance = seq.on_timer(timer(advance).token);
            }

            let mut total = 0;
            while seq.phase() == AnimationPhase::Serif {
                let t = timer(advance);
                total += t.delay_ms;
                advance = seq.on_timer(t.token);
            }

            assert_eq!(total, config.serif_duration_ms(lines.len()));
            let spoken: Vec<String> = seq
                .cues()
                .events()
                .iter()
                .filter_map(|e| match e {
                    CueEvent::Speak { text } => Some(text.clone()),
                    _ => None,
                })
                .collect();
            let expected: Vec<String> = lines
                .iter()
                .map(|l| l.trim_matches(|c| c == '「' || c == '」').to_string())
                .collect();
            assert_eq!(spoken, expected);
        }
    }

    #[test]
    fn oversized_serif_timing_saturates() {
        let config = TimelineConfig {
            serif_per_line_ms: 2_000_000_000,
            serif_buffer_ms: u32::MAX,
            ..Default::default()
        };
        let mut seq = Sequencer::new(CueBuffer::new(), config, ResultEnding::Pause);
        let mut advance = seq.start(result(Rarity::R, &["a", "b", "c"]));
        while seq.phase() != AnimationPhase::Serif {
            advance = seq.on_timer(timer(advance).token);
        }

        let mut delays = Vec::new();
        while seq.phase() == AnimationPhase::Serif {
            let t = timer(advance);
            delays.push(t.delay_ms);
            advance = seq.on_timer(t.token);
        }
        assert_eq!(delays, vec![2_000_000_000, 2_000_000_000, u32::MAX]);
        assert_eq!(seq.phase(), AnimationPhase::RarityBadge);
    }

    #[test]
    fn current_serif_tracks_line_on_screen() {
        let mut seq = sequencer(ResultEnding::Pause);
        let mut advance = seq.start(result(Rarity::R, &["a", "b"]));
        assert_eq!(seq.current_serif(), None);

        while seq.phase() != AnimationPhase::Serif {
            advance = seq.on_timer(timer(advance).token);
        }
        assert_eq!(seq.current_serif(), Some(0));

        advance = seq.on_timer(timer(advance).token);
        assert_eq!(seq.current_serif(), Some(1));

        seq.on_timer(timer(advance).token);
        assert_eq!(seq.phase(), AnimationPhase::RarityBadge);
        assert_eq!(seq.current_serif(), Some(1));
    }

    #[test]
    fn name_layer_stays_visible_until_fadeout() {
        let mut seq = sequencer(ResultEnding::AutoAdvance);
        let mut advance = seq.start(result(Rarity::Sr, &["a"]));
        let mut reached = false;
        while let Advance::Scheduled { timer } = advance {
            if seq.phase() == AnimationPhase::NameReveal {
                reached = true;
            }
            if reached {
                let expect = seq.phase() != AnimationPhase::Fadeout;
                assert_eq!(seq.layers().name, expect, "at {:?}", seq.phase());
            }
            advance = seq.on_timer(timer.token);
        }
        assert!(reached);
    }

    #[test]
    fn cancel_before_timer_prevents_next_cue() {
        let mut seq = sequencer(ResultEnding::Pause);
        let mut advance = seq.start(result(Rarity::Sr, &["a"]));
        // Shatter -> Flash
        advance = seq.on_timer(timer(advance).token);
        assert_eq!(seq.phase(), AnimationPhase::Flash);
        let pending = timer(advance);

        seq.cancel();
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        assert_eq!(seq.on_timer(pending.token), Advance::Stale);
        assert!(!played(seq.cues(), SoundCue::RarityGet(Rarity::Sr)));
    }

    #[test]
    fn stale_timer_cannot_touch_new_run() {
        let mut seq = sequencer(ResultEnding::Pause);
        let old = timer(seq.start(result(Rarity::N, &["a"])));
        let new = timer(seq.start(result(Rarity::Ssr, &["b"])));
        assert_ne!(old.token, new.token);

        assert_eq!(seq.on_timer(old.token), Advance::Stale);
        assert_eq!(seq.phase(), AnimationPhase::Shatter);
        assert_eq!(seq.result().unwrap().character.rarity, Rarity::Ssr);

        seq.on_timer(new.token);
        assert_eq!(seq.phase(), AnimationPhase::Flash);
    }

    #[test]
    fn complete_is_ignored_mid_sequence() {
        let mut seq = sequencer(ResultEnding::Pause);
        seq.start(result(Rarity::R, &["a"]));
        assert!(!seq.complete());
        assert!(seq.is_running());
    }

    #[test]
    fn entry_cues_fire_in_phase_order() {
        let mut seq = sequencer(ResultEnding::AutoAdvance);
        let first = seq.start(result(Rarity::Ssr, &["x"]));
        run_to_end(&mut seq, first);

        let cues: Vec<CueEvent> = seq.cues_mut().drain();
        let order: Vec<String> = cues
            .iter()
            .map(|e| match e {
                CueEvent::Play { cue, .. } => format!("{:?}", cue),
                CueEvent::Speak { text } => format!("speak:{}", text),
            })
            .collect();
        assert_eq!(
            order,
            vec![
                "Roll",
                "RarityGet(Ssr)",
                "SerifAppear",
                "speak:x",
                "Cutin",
            ]
        );
    }

    #[test]
    fn muted_run_still_advances() {
        let mut seq = sequencer(ResultEnding::AutoAdvance);
        seq.set_muted(true);
        let first = seq.start(result(Rarity::R, &["a"]));
        let (_, last) = run_to_end(&mut seq, first);
        assert_eq!(last, Advance::Completed);
        assert!(seq.cues().events().is_empty());
    }
}
