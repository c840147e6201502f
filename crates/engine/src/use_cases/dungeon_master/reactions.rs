//! Companion reaction selector.
//!
//! Picks canned, personality-flavoured lines for companions when the model is
//! not available or its own companion output came back empty. Each companion
//! is sampled independently, so most turns only some of them speak.

use std::sync::Arc;

use mythicbot_domain::{ActionType, Companion, CompanionUtterance, Personality};

use crate::infrastructure::ports::RandomPort;

/// Phrase bucket a reaction is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionBucket {
    Combat,
    Exploration,
    Interaction,
    Success,
    Failure,
    Trivial,
}

impl ReactionBucket {
    /// Bucket for a finished turn. No success axis means trivial.
    pub fn for_outcome(is_success: Option<bool>) -> Self {
        match is_success {
            None => Self::Trivial,
            Some(true) => Self::Success,
            Some(false) => Self::Failure,
        }
    }

    /// Bucket for the moment before a roll.
    pub fn for_anticipation(action_type: ActionType) -> Self {
        match action_type {
            ActionType::Combat => Self::Combat,
            ActionType::Exploration => Self::Exploration,
            ActionType::Interaction => Self::Interaction,
            ActionType::Trivial => Self::Trivial,
        }
    }

    pub fn is_trivial(&self) -> bool {
        matches!(self, Self::Trivial)
    }
}

pub struct CompanionReactionSelector {
    random: Arc<dyn RandomPort>,
    trivial_percent: u32,
    eventful_percent: u32,
}

impl CompanionReactionSelector {
    pub fn new(random: Arc<dyn RandomPort>, trivial_percent: u32, eventful_percent: u32) -> Self {
        Self {
            random,
            trivial_percent: trivial_percent.min(100),
            eventful_percent: eventful_percent.min(100),
        }
    }

    /// Reactions to a finished turn.
    pub fn select(
        &self,
        companions: &[Companion],
        action_type: ActionType,
        is_success: Option<bool>,
    ) -> Vec<CompanionUtterance> {
        let bucket = ReactionBucket::for_outcome(is_success);
        tracing::trace!(action_type = %action_type, ?bucket, "Selecting companion reactions");
        self.select_from(companions, bucket)
    }

    /// Reactions while the party waits on a roll.
    pub fn select_anticipation(
        &self,
        companions: &[Companion],
        action_type: ActionType,
    ) -> Vec<CompanionUtterance> {
        self.select_from(companions, ReactionBucket::for_anticipation(action_type))
    }

    fn select_from(&self, companions: &[Companion], bucket: ReactionBucket) -> Vec<CompanionUtterance> {
        let percent = if bucket.is_trivial() {
            self.trivial_percent
        } else {
            self.eventful_percent
        };

        companions
            .iter()
            .filter(|c| !c.name.trim().is_empty())
            .filter(|_| (self.random.gen_range(0, 99) as u32) < percent)
            .map(|companion| {
                let pool = phrases(bucket, companion.personality);
                let idx = self.random.gen_range(0, pool.len() as i32 - 1);
                let line = pool[(idx.max(0) as usize).min(pool.len() - 1)];
                CompanionUtterance::new(companion, line)
            })
            .collect()
    }
}

/// Canned lines for one bucket and personality.
pub fn phrases(bucket: ReactionBucket, personality: Personality) -> &'static [&'static str; 3] {
    use Personality::*;
    use ReactionBucket::*;

    match (bucket, personality) {
        (Combat, Cheerful) => &["Let's show them what we've got!", "This is exciting!", "We can do this, team!"],
        (Combat, Stoic) => &["Stay focused.", "Watch your flank.", "I have your back."],
        (Combat, Sarcastic) => &["Oh great, another fight...", "Try not to get killed, will you?", "Here we go again."],
        (Combat, Wise) => &["Strike true, but strike smart.", "Patience is key in battle.", "Observe before you act."],
        (Combat, Impulsive) => &["CHARGE!", "I'll take the big one!", "No time to think, let's GO!"],
        (Combat, Cautious) => &["Be careful!", "Maybe we should plan this...", "Watch out for traps!"],
        (Combat, Grumpy) => &["Ugh, more fighting.", "Let's get this over with.", "I was having a nice day."],
        (Combat, Mischievous) => &["Ooh, this'll be fun!", "Dibs on their loot!", "Watch this trick!"],

        (Exploration, Cheerful) => &["Ooh, what's over there?", "This place is amazing!", "Adventure awaits!"],
        (Exploration, Stoic) => &["Proceed with caution.", "Something feels off.", "Stay alert."],
        (Exploration, Sarcastic) => &["Spooky. Very original.", "Let me guess, it's trapped.", "What could go wrong?"],
        (Exploration, Wise) => &["These ruins hold many secrets.", "The ancients built well.", "There is much to learn here."],
        (Exploration, Impulsive) => &["Let's touch everything!", "I'll check that room!", "Race you to the end!"],
        (Exploration, Cautious) => &["Should we really go in there?", "I've got a bad feeling...", "Let someone else go first."],
        (Exploration, Grumpy) => &["Another dusty ruin.", "My feet hurt.", "Are we there yet?"],
        (Exploration, Mischievous) => &["I bet there's treasure!", "What's behind door number one?", "Let's split up!"],

        (Interaction, Cheerful) => &["Hello, friend!", "Nice to meet you!", "What a lovely person!"],
        (Interaction, Stoic) => &["...", "Speak your purpose.", "We mean no harm."],
        (Interaction, Sarcastic) => &["Oh, this will be productive.", "I'm sure we can trust them.", "Charming."],
        (Interaction, Wise) => &["Choose your words carefully.", "There is wisdom in listening.", "What knowledge do you seek?"],
        (Interaction, Impulsive) => &["Hi! We're adventurers!", "Do you have any quests?", "We're here to help!"],
        (Interaction, Cautious) => &["Can we trust them?", "Something seems suspicious.", "Be on your guard."],
        (Interaction, Grumpy) => &["Can we hurry this up?", "I'll wait over here.", "Just get the information."],
        (Interaction, Mischievous) => &["I could pickpocket them...", "Want me to distract them?", "They look rich!"],

        (Success, Cheerful) => &["We did it!", "Amazing work!", "I knew we could do it!"],
        (Success, Stoic) => &["Well done.", "As expected.", "Good."],
        (Success, Sarcastic) => &["Wow, didn't see that coming.", "Color me impressed.", "Finally, something works."],
        (Success, Wise) => &["Skill and fortune align.", "A lesson well learned.", "Victory comes to the prepared."],
        (Success, Impulsive) => &["YEAH! That was awesome!", "Did you see that?!", "Let's do it again!"],
        (Success, Cautious) => &["Phew! That was close.", "Thank goodness.", "We got lucky there."],
        (Success, Grumpy) => &["About time.", "Took long enough.", "Can we rest now?"],
        (Success, Mischievous) => &["Ha! Take that!", "Too easy!", "Who's next?"],

        (Failure, Cheerful) => &["That's okay, we'll try again!", "Every setback is a setup!", "No worries!"],
        (Failure, Stoic) => &["It happens.", "Regroup.", "Learn and adapt."],
        (Failure, Sarcastic) => &["Nailed it.", "Brilliant strategy.", "Well, that was inevitable."],
        (Failure, Wise) => &["Failure teaches more than success.", "We must reconsider.", "All is not lost."],
        (Failure, Impulsive) => &["Let's try again RIGHT NOW!", "Oops! My bad!", "That didn't count!"],
        (Failure, Cautious) => &["I warned you!", "We should have been more careful.", "This was too risky."],
        (Failure, Grumpy) => &["Figures.", "This is fine. Everything's fine.", "I'm going home."],
        (Failure, Mischievous) => &["Ha! Wait, we lost?", "That wasn't supposed to happen.", "Plan B?"],

        (Trivial, Cheerful) => &["Nice!", "Cool!", "Looking good!"],
        (Trivial, Stoic) => &["Proceed.", "Continue.", "*nods*"],
        (Trivial, Sarcastic) => &["Riveting.", "What's next, breathing?", "Groundbreaking stuff."],
        (Trivial, Wise) => &["Every step has purpose.", "Well considered.", "As it should be."],
        (Trivial, Impulsive) => &["Okay now what?!", "Faster! Let's go!", "Boring! What's next?"],
        (Trivial, Cautious) => &["Good, that was safe.", "No problems there.", "One step at a time."],
        (Trivial, Grumpy) => &["...okay.", "Fine.", "Whatever."],
        (Trivial, Mischievous) => &["Ooh, can I do something too?", "My turn my turn!", "Let me help!"],
    }
}
