//! Bilingual (Hindi/English) reply templates, quotes and suggestions.
//!
//! The assistant answers in whichever language the user last wrote in.
//! Templates are functions rather than a lookup table so placeholder
//! substitution is checked at compile time.

use serde::{Deserialize, Serialize};

/// Reply language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Hi,
    #[default]
    En,
}

impl Language {
    /// Detect the language of a message.
    ///
    /// Any Devanagari code point marks the message as Hindi; everything else
    /// is treated as English. Romanized Hindi therefore reads as English.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
            Self::Hi
        } else {
            Self::En
        }
    }

    /// Speech-recognition / TTS locale code
    #[must_use]
    pub const fn locale(self) -> &'static str {
        match self {
            Self::Hi => "hi-IN",
            Self::En => "en-IN",
        }
    }

    /// Amazon Polly voice used on reminder calls
    #[must_use]
    pub const fn polly_voice(self) -> &'static str {
        match self {
            Self::Hi => "Polly.Aditi",
            Self::En => "Polly.Raveena",
        }
    }
}

/// First-contact welcome with feature overview
#[must_use]
pub fn welcome(lang: Language) -> String {
    match lang {
        Language::Hi => "🙏 नमस्ते! मैं आपका व्यक्तिगत सहायक हूं। मैं आपकी मदद कर सकता हूं:\n\n\
            📅 कैलेंडर और रिमाइंडर\n\
            🎯 दैनिक लक्ष्य\n\
            🍳 रेसिपी खोजना\n\
            📞 कॉल रिमाइंडर\n\n\
            कोशिश करें: \"कल सुबह 7 बजे याद दिलाना\" या \"पनीर की रेसिपी\"\n\n\
            ✨ मुझे कोई नाम देना चाहते हैं? बस लिखें \"तुम्हारा नाम [नाम] है\""
            .to_string(),
        Language::En => "🙏 Hello! I'm your personal assistant. I can help you with:\n\n\
            📅 Calendar and reminders\n\
            🎯 Daily goals\n\
            🍳 Finding recipes\n\
            📞 Call reminders\n\n\
            Try: \"Remind me tomorrow at 7 AM\" or \"Paneer recipe\"\n\n\
            ✨ Want to give me a name? Just say \"Your name is [name]\""
            .to_string(),
    }
}

/// Greeting once the assistant has been given a name
#[must_use]
pub fn introduction(lang: Language, name: &str) -> String {
    match lang {
        Language::Hi => {
            format!("👋 नमस्ते! मैं {name} हूं, आपका व्यक्तिगत सहायक। कैसे मदद कर सकता हूं?")
        }
        Language::En => {
            format!("👋 Hello! I'm {name}, your personal assistant. How can I help you?")
        }
    }
}

/// Confirmation after the user names the assistant
#[must_use]
pub fn name_set(lang: Language, name: &str) -> String {
    match lang {
        Language::Hi => {
            format!("😊 धन्यवाद! अब से मेरा नाम {name} है। आप मुझे {name} कह सकते हैं!")
        }
        Language::En => {
            format!("😊 Thank you! From now on, my name is {name}. You can call me {name}!")
        }
    }
}

/// Prompt shown when a set-name message carried no parsable name
#[must_use]
pub fn name_prompt(lang: Language) -> String {
    match lang {
        Language::Hi => "कृपया बताएं आप मुझे क्या नाम देना चाहते हैं? \
            उदाहरण: 'तुम्हारा नाम राज है'"
            .to_string(),
        Language::En => "Please tell me what name you'd like to give me? \
            Example: 'Your name is Raj'"
            .to_string(),
    }
}

/// Confirmation after a reminder is scheduled
#[must_use]
pub fn reminder_set(lang: Language, task: &str, date: &str, time: &str) -> String {
    match lang {
        Language::Hi => format!("✅ रिमाइंडर सेट: {task}\n📅 {date}\n⏰ {time}"),
        Language::En => format!("✅ Reminder set: {task}\n📅 {date}\n⏰ {time}"),
    }
}

/// Shown when a reminder message carried no parsable time
#[must_use]
pub fn reminder_time_missing(lang: Language) -> String {
    match lang {
        Language::Hi => "कृपया समय बताएं। उदाहरण: 'कल सुबह 9 बजे याद दिलाना' \
            या 'Remind me in 30 minutes'"
            .to_string(),
        Language::En => "Please specify a time. Examples:\n\
            • Remind me to exercise at 6 PM\n\
            • Remind me in 30 minutes to take medicine"
            .to_string(),
    }
}

/// The reminder delivery message itself
#[must_use]
pub fn reminder_fire(lang: Language, assistant_name: &str, task: &str) -> String {
    match lang {
        Language::Hi => format!(
            "🔔 {assistant_name} की ओर से रिमाइंडर: {task}\n\n\
            पूरा होने पर 'done' भेजें, 30 मिनट टालने के लिए 'snooze'।"
        ),
        Language::En => format!(
            "🔔 *Reminder from {assistant_name}*\n\n📌 {task}\n\n\
            Reply 'done' to mark as complete or 'snooze' to delay by 30 mins."
        ),
    }
}

/// Spoken text for a reminder voice call
#[must_use]
pub fn reminder_call_script(lang: Language, assistant_name: &str, task: &str) -> String {
    match lang {
        Language::Hi => {
            format!("नमस्ते, मैं {assistant_name} हूं। यह आपका रिमाइंडर है: {task}")
        }
        Language::En => {
            format!("Hello, this is {assistant_name}. This is your reminder: {task}")
        }
    }
}

/// Acknowledgment that a voice note arrived and is being processed
#[must_use]
pub fn voice_received(lang: Language) -> String {
    match lang {
        Language::Hi => "🎤 वॉइस नोट मिला! मैं इसे सुन रहा हूं...".to_string(),
        Language::En => "🎤 Voice note received! Let me listen to this...".to_string(),
    }
}

/// Summary of reminders extracted from a voice note
#[must_use]
pub fn voice_processed(lang: Language, reminders: &str) -> String {
    match lang {
        Language::Hi => format!(
            "✅ समझ गया! मैंने ये रिमाइंडर सेट किए हैं:\n{reminders}\n\n कुछ और जोड़ना है?"
        ),
        Language::En => format!(
            "✅ Got it! I've set these reminders:\n{reminders}\n\n Anything else to add?"
        ),
    }
}

/// Voice note transcribed but no times found in it
#[must_use]
pub fn voice_no_tasks(lang: Language, transcript: &str) -> String {
    match lang {
        Language::Hi => format!(
            "मैंने सुना: '{transcript}'\n\nकृपया रिमाइंडर के लिए समय बताएं?"
        ),
        Language::En => format!(
            "I heard: '{transcript}'\n\nCould you please specify the time for your reminders?"
        ),
    }
}

/// Voice note could not be transcribed
#[must_use]
pub fn voice_failed(lang: Language) -> String {
    match lang {
        Language::Hi => "माफ़ करें, मैं वॉइस नोट समझ नहीं पाया। \
            कृपया फिर से कोशिश करें या संदेश लिखें।"
            .to_string(),
        Language::En => "Sorry, I couldn't understand the voice note. \
            Please try again or type your message."
            .to_string(),
    }
}

/// Morning greeting with the day's schedule and a quote
#[must_use]
pub fn morning_greeting(lang: Language, date: &str, schedule: &str, quote: &str) -> String {
    match lang {
        Language::Hi => format!(
            "🌅 शुभ प्रभात! आज {date} है\n\n📋 आज का कार्यक्रम:\n{schedule}\n\n💭 विचार: {quote}"
        ),
        Language::En => format!(
            "🌅 Good morning! Today is {date}\n\n📋 Today's schedule:\n{schedule}\n\n💭 Thought: {quote}"
        ),
    }
}

/// Schedule line shown when the calendar has nothing today
#[must_use]
pub fn no_events(lang: Language) -> String {
    match lang {
        Language::Hi => "आज कोई मीटिंग नहीं है। दिन अच्छा बिताएं! 🌸".to_string(),
        Language::En => "No meetings today. Have a great day! 🌸".to_string(),
    }
}

/// Proactive check-in for a given slot ("morning" / "afternoon" / "evening")
#[must_use]
pub fn proactive(slot: &str, lang: Language, assistant_name: &str) -> String {
    match (slot, lang) {
        ("morning", Language::Hi) => format!(
            "🌅 शुभ प्रभात! मैं {assistant_name} हूं।\n\n आज के लिए क्या प्लान है? \
            मुझे बताएं अगर कोई रिमाइंडर चाहिए! 😊\n\n💡 टिप: आप वॉइस नोट भी भेज सकते हैं!"
        ),
        ("morning", Language::En) => format!(
            "🌅 Good morning! It's {assistant_name} here.\n\n What are your plans for today? \
            Let me know if you need any reminders! 😊\n\n💡 Tip: You can also send me voice notes!"
        ),
        ("afternoon", Language::Hi) => format!(
            "☀️ नमस्ते! {assistant_name} यहाँ है।\n\n दिन कैसा जा रहा है? \
            कोई रिमाइंडर या मदद चाहिए? 🤔"
        ),
        ("afternoon", Language::En) => format!(
            "☀️ Hello! {assistant_name} checking in.\n\n How's your day going? \
            Need any reminders or help? 🤔"
        ),
        (_, Language::Hi) => format!(
            "🌆 शाम की चाय का समय! ☕\n\n कल के लिए कुछ प्लान करना है? \
            मैं {assistant_name}, मदद के लिए तैयार हूं!"
        ),
        (_, Language::En) => format!(
            "🌆 Evening tea time! ☕\n\n Want to plan anything for tomorrow? \
            {assistant_name} here to help!"
        ),
    }
}

/// Confirmation after a calendar event is created
#[must_use]
pub fn calendar_add(
    lang: Language,
    title: &str,
    date: &str,
    time: &str,
    duration: i64,
    link: &str,
) -> String {
    match lang {
        Language::Hi => format!(
            "✅ कैलेंडर में जोड़ा गया:\n📅 {title}\n⏰ {date} को {time}\n\
            ⏱️ अवधि: {duration} मिनट\n🔗 {link}"
        ),
        Language::En => format!(
            "✅ Added to calendar:\n📅 {title}\n⏰ {date} at {time}\n\
            ⏱️ Duration: {duration} minutes\n🔗 {link}"
        ),
    }
}

/// Calendar command could not be parsed or the insert failed
#[must_use]
pub fn calendar_error(lang: Language) -> String {
    match lang {
        Language::Hi => "❌ कैलेंडर में जोड़ने में त्रुटि। कृपया फिर से कोशिश करें।\n\
            उदाहरण: \"कल 3 बजे मीटिंग कैलेंडर में जोड़ें\""
            .to_string(),
        Language::En => "❌ Error adding to calendar. Please try again.\n\
            Example: \"Add meeting tomorrow at 3 PM to calendar\""
            .to_string(),
    }
}

/// Confirmation after daily goals are recorded
#[must_use]
pub fn goals_set(lang: Language, goals: &str) -> String {
    match lang {
        Language::Hi => format!(
            "🎯 आज के लक्ष्य सेट!\n\nमैं इन पर नज़र रखूंगा:\n{goals}\n\n\
            📱 मैं 2 बजे, 5 बजे और 8 बजे हाल पूछूंगा। \
            पूरा होने पर \"completed [काम]\" या \"all done\" लिखें!"
        ),
        Language::En => format!(
            "🎯 *Goals Set for Today!*\n\nI'll track these for you:\n{goals}\n\n\
            📱 I'll check in at:\n• 2:00 PM\n• 5:00 PM\n• 8:00 PM\n\n\
            To help you stay on track! You can update me anytime by saying \
            \"completed [task]\" or \"all done\"!"
        ),
    }
}

/// Goal check-in listing pending tasks
#[must_use]
pub fn goal_checkin(lang: Language, assistant_name: &str, pending: &str) -> String {
    match lang {
        Language::Hi => format!(
            "👋 {assistant_name} हाल पूछ रहा है!\n\nलक्ष्यों पर प्रगति कैसी है?\n\n\
            📋 बाकी काम:\n{pending}\n\n\
            जो पूरा हुआ वो बताएं, या सब हो गया तो 'all done' लिखें!"
        ),
        Language::En => format!(
            "👋 *{assistant_name} checking in!*\n\nHow's progress on your goals?\n\n\
            📋 *Pending tasks:*\n{pending}\n\n\
            Reply with what you've completed or 'all done' if finished!"
        ),
    }
}

/// All goals completed
#[must_use]
pub fn goals_all_done(lang: Language) -> String {
    match lang {
        Language::Hi => "🎉 शानदार! आज के सभी लक्ष्य पूरे! बहुत बढ़िया! 🌟".to_string(),
        Language::En => {
            "🎉 Amazing! You've completed all your goals for today! Well done! 🌟".to_string()
        }
    }
}

/// Menu of everything the assistant understands
#[must_use]
pub fn help(lang: Language) -> String {
    match lang {
        Language::Hi => "📚 मदद\n\n\
            *रिमाइंडर:*\n• कल सुबह 9 बजे याद दिलाना\n• Remind me in 30 minutes\n\n\
            *लक्ष्य:*\n• My goals today are...\n• completed [काम] / all done\n\n\
            *रेसिपी:*\n• पनीर की रेसिपी\n\n\
            *कैलेंडर:*\n• आज का कार्यक्रम\n• कल 3 बजे मीटिंग कैलेंडर में जोड़ें\n\n\
            *नाम:*\n• तुम्हारा नाम राज है"
            .to_string(),
        Language::En => "📚 *Help Menu*\n\n\
            *Reminders:*\n• Remind me to [task] at [time]\n• Remind me in 30 minutes to [task]\n\n\
            *Goals:*\n• My goals today are [goal1], [goal2]\n• Completed [specific task]\n• All done\n\n\
            *Recipes:*\n• Recipe for [dish name]\n\n\
            *Calendar:*\n• What's my schedule\n• Add meeting tomorrow at 3 PM to calendar\n• Enable morning briefings\n\n\
            *Personalization:*\n• Your name is [name]"
            .to_string(),
    }
}

/// Morning briefings switched on
#[must_use]
pub fn briefing_enabled(lang: Language) -> String {
    match lang {
        Language::Hi => "☀️ मॉर्निंग ब्रीफिंग चालू! मैं रोज़ सुबह 7 बजे आपका \
            कार्यक्रम भेजूंगा और दिन के लक्ष्य पूछूंगा।"
            .to_string(),
        Language::En => "☀️ Morning briefings enabled! I'll message you every day at 7 AM \
            with your schedule and ask for your daily goals."
            .to_string(),
    }
}

/// Offer to switch morning briefings on
#[must_use]
pub fn briefing_offer(lang: Language) -> String {
    match lang {
        Language::Hi => "हर सुबह 7 बजे ब्रीफिंग चाहिए? \
            'Enable morning briefings' लिखें!"
            .to_string(),
        Language::En => "Would you like me to send you a morning briefing every day at 7 AM? \
            Say 'Enable morning briefings' to start!"
            .to_string(),
    }
}

/// Acknowledgment for a "done" reply to a delivered reminder
#[must_use]
pub fn reminder_done(lang: Language) -> String {
    match lang {
        Language::Hi => "✅ बढ़िया! रिमाइंडर पूरा हुआ।".to_string(),
        Language::En => "✅ Great! Reminder marked as complete.".to_string(),
    }
}

/// Acknowledgment for a "snooze" reply
#[must_use]
pub fn reminder_snoozed(lang: Language, minutes: i64) -> String {
    match lang {
        Language::Hi => format!("⏰ ठीक है, {minutes} मिनट बाद फिर याद दिलाऊंगा।"),
        Language::En => format!("⏰ Okay, I'll remind you again in {minutes} minutes."),
    }
}

/// "done"/"snooze" arrived but no reminder was recently delivered
#[must_use]
pub fn reminder_none_active(lang: Language) -> String {
    match lang {
        Language::Hi => "अभी कोई रिमाइंडर नहीं भेजा गया है।".to_string(),
        Language::En => "There's no recently delivered reminder to update.".to_string(),
    }
}

/// A goals message carried no parsable goal list
#[must_use]
pub fn goals_prompt(lang: Language) -> String {
    match lang {
        Language::Hi => "कृपया अपने लक्ष्य बताएं। उदाहरण: \
            'My goals today are पढ़ाई, योग'"
            .to_string(),
        Language::En => "Please tell me your goals. Example: \
            'My goals today are study math, exercise, and finish report'"
            .to_string(),
    }
}

/// Some goals completed, others remain
#[must_use]
pub fn goal_progress(lang: Language, pending: &str) -> String {
    match lang {
        Language::Hi => format!("✅ अच्छी प्रगति!\n\nअभी बाकी:\n{pending}"),
        Language::En => format!("✅ Great progress!\n\nStill pending:\n{pending}"),
    }
}

/// A completion message named no known goal
#[must_use]
pub fn goal_nothing_matched(lang: Language) -> String {
    match lang {
        Language::Hi => "कौन सा काम पूरा हुआ? कृपया स्पष्ट बताएं या 'all done' लिखें।".to_string(),
        Language::En => {
            "Which task did you complete? Please be specific or say 'all done'".to_string()
        }
    }
}

/// Completion arrived but no goals were set today
#[must_use]
pub fn no_goals_today(lang: Language) -> String {
    match lang {
        Language::Hi => "आज कोई लक्ष्य सेट नहीं है। 'My goals today are...' से शुरू करें!".to_string(),
        Language::En => {
            "You haven't set any goals today. Say 'My goals today are...' to get started!"
                .to_string()
        }
    }
}

const QUOTES_HI: [&str; 3] = [
    "जो आज कठिन लग रहा है, वह कल आपकी ताकत बनेगा।",
    "सफलता की शुरुआत हमेशा छोटे कदमों से होती है।",
    "हर नया दिन एक नई शुरुआत है।",
];

const QUOTES_EN: [&str; 3] = [
    "What seems difficult today will become your strength tomorrow.",
    "Success always begins with small steps.",
    "Every new day is a fresh start.",
];

/// Quote of the day, rotated by day of month
#[must_use]
pub fn quote_of_the_day(lang: Language, day_of_month: u32) -> &'static str {
    let quotes: &[&str] = match lang {
        Language::Hi => &QUOTES_HI,
        Language::En => &QUOTES_EN,
    };
    quotes[day_of_month as usize % quotes.len()]
}

/// Activity suggestions for the current time of day
#[must_use]
pub fn suggestions(lang: Language, hour: u32) -> String {
    let lines: &[&str] = match (hour, lang) {
        (5..=11, Language::Hi) => &[
            "🧘 योग या ध्यान करें",
            "📖 किताब पढ़ें",
            "🚶 मॉर्निंग वॉक पर जाएं",
        ],
        (5..=11, Language::En) => &[
            "🧘 Do yoga or meditation",
            "📖 Read a book",
            "🚶 Go for a morning walk",
        ],
        (12..=16, Language::Hi) => &[
            "☕ चाय का आनंद लें",
            "📝 दिन की योजना बनाएं",
            "🎵 संगीत सुनें",
        ],
        (12..=16, Language::En) => &[
            "☕ Enjoy some tea",
            "📝 Plan your day",
            "🎵 Listen to music",
        ],
        (_, Language::Hi) => &[
            "🌅 सूर्यास्त देखें",
            "👨‍👩‍👧 परिवार के साथ समय बिताएं",
            "🍳 कुछ नया बनाएं",
        ],
        (_, Language::En) => &[
            "🌅 Watch the sunset",
            "👨‍👩‍👧 Spend time with family",
            "🍳 Try a new recipe",
        ],
    };
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detect() {
        assert_eq!(Language::detect("कल सुबह 7 बजे याद दिलाना"), Language::Hi);
        assert_eq!(Language::detect("remind me tomorrow"), Language::En);
        // Mixed text counts as Hindi as soon as Devanagari appears
        assert_eq!(Language::detect("remind me कल"), Language::Hi);
        assert_eq!(Language::detect(""), Language::En);
    }

    #[test]
    fn test_polly_voices() {
        assert_eq!(Language::Hi.polly_voice(), "Polly.Aditi");
        assert_eq!(Language::En.polly_voice(), "Polly.Raveena");
        assert_eq!(Language::Hi.locale(), "hi-IN");
    }

    #[test]
    fn test_templates_substitute_placeholders() {
        let text = reminder_set(Language::En, "Call Mom", "01/03/2025", "05:00 PM");
        assert!(text.contains("Call Mom"));
        assert!(text.contains("01/03/2025"));

        let text = introduction(Language::Hi, "राज");
        assert!(text.contains("राज"));

        let text = goal_checkin(Language::En, "Jarvis", "• exercise");
        assert!(text.contains("Jarvis"));
        assert!(text.contains("• exercise"));
    }

    #[test]
    fn test_quote_rotation() {
        // Quote selection wraps around the 3-element table
        assert_eq!(
            quote_of_the_day(Language::En, 1),
            quote_of_the_day(Language::En, 4)
        );
        assert_ne!(
            quote_of_the_day(Language::En, 1),
            quote_of_the_day(Language::En, 2)
        );
    }

    #[test]
    fn test_suggestions_by_period() {
        assert!(suggestions(Language::En, 8).contains("morning walk"));
        assert!(suggestions(Language::En, 14).contains("tea"));
        assert!(suggestions(Language::En, 19).contains("sunset"));
        assert!(suggestions(Language::Hi, 8).contains("योग"));
    }
}
