//! Sample customer-support conversations for demos and manual testing.

use serde_json::json;
use tracing::info;

use crate::history::core::errors::StoreResult;
use crate::history::core::ids::SessionId;
use crate::history::core::role::Role;
use crate::history::storage::ConversationStore;

/// One canned conversation.
#[derive(Clone, Copy, Debug)]
pub struct SampleConversation {
    /// Session handle.
    pub session_id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Turns in order.
    pub turns: &'static [(Role, &'static str)],
}

/// Report of a seeding run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Conversations that received messages.
    pub seeded: Vec<SessionId>,
    /// Conversations left alone because they already had messages.
    pub skipped: Vec<SessionId>,
    /// Messages inserted.
    pub messages: usize,
}

const SAMPLES: &[SampleConversation] = &[
    SampleConversation {
        session_id: "session_001",
        title: "Order Refund Request",
        turns: &[
            (Role::Human, "I want to request a refund for my order #12345."),
            (Role::Ai, "I'd be happy to help you with your refund request for order #12345. May I ask the reason for the refund?"),
            (Role::Human, "The product arrived damaged. The packaging was torn and the item inside was broken."),
            (Role::Ai, "I'm sorry to hear that your product arrived damaged. I've initiated a refund for order #12345. You should receive the full refund within 3-5 business days. We'll also send you a prepaid return label via email."),
            (Role::Human, "Thank you! Do I need to return the damaged item?"),
            (Role::Ai, "Yes, please use the prepaid label to return the damaged item within 14 days. Once we receive it, your refund will be processed immediately."),
        ],
    },
    SampleConversation {
        session_id: "session_002",
        title: "Shipping Inquiry",
        turns: &[
            (Role::Human, "Where is my order? It was supposed to arrive yesterday."),
            (Role::Ai, "I understand your concern about the delayed delivery. Could you please provide me with your order number so I can track it for you?"),
            (Role::Human, "The order number is #67890"),
            (Role::Ai, "Thank you! I'm checking the status of order #67890 now. I can see that your package is currently in transit and experienced a slight delay at our distribution center. The updated delivery date is tomorrow by 6 PM."),
            (Role::Human, "Is there a tracking number I can use?"),
            (Role::Ai, "Yes, your tracking number is TRACK123456789. You can use this on our website or the carrier's website to see real-time updates. I've also sent this information to your email."),
        ],
    },
    SampleConversation {
        session_id: "session_003",
        title: "Product Recommendation",
        turns: &[
            (Role::Human, "I'm looking for a good laptop for programming. What do you recommend?"),
            (Role::Ai, "I'd be happy to help you find the right laptop for programming! To give you the best recommendation, could you tell me your budget range and whether you have any specific requirements (like screen size or operating system preference)?"),
            (Role::Human, "My budget is around $1500, and I prefer something with at least 16GB RAM. Screen size doesn't matter much."),
            (Role::Ai, "Based on your requirements, I recommend the TechPro Developer 15. It comes with 16GB RAM (expandable to 32GB), Intel i7 processor, 512GB SSD, and is priced at $1,399. It's specifically optimized for development work with excellent keyboard and battery life."),
            (Role::Human, "That sounds great! Is it available in stock?"),
            (Role::Ai, "Yes, the TechPro Developer 15 is currently in stock! We have 5 units available for immediate shipping. Would you like me to add it to your cart or would you like to know more about its specifications?"),
            (Role::Human, "Please add it to my cart. Also, do you offer any warranty?"),
            (Role::Ai, "I've added the TechPro Developer 15 to your cart! Yes, it comes with a 1-year manufacturer warranty, and you can extend it to 3 years for an additional $199. The extended warranty covers accidental damage and provides priority support."),
        ],
    },
    SampleConversation {
        session_id: "session_004",
        title: "Account Issues",
        turns: &[
            (Role::Human, "I can't log into my account. It says my password is incorrect but I'm sure it's right."),
            (Role::Ai, "I'm sorry you're having trouble accessing your account. For security purposes, could you please provide the email address associated with your account?"),
            (Role::Human, "It's john.doe@email.com"),
            (Role::Ai, "Thank you! I can see your account in our system. I'll send a password reset link to john.doe@email.com right away. You should receive it within the next 5 minutes."),
            (Role::Human, "I received the link and reset my password, but it's still not working."),
            (Role::Ai, "Let me investigate this further. I see there might be a cache issue. Could you please try clearing your browser's cookies and cache, or try logging in using an incognito/private browser window?"),
            (Role::Human, "That worked! Thank you so much!"),
            (Role::Ai, "Excellent! I'm glad that resolved the issue. For future reference, if you experience login problems, clearing cache and cookies often helps. Is there anything else I can assist you with today?"),
        ],
    },
    SampleConversation {
        session_id: "session_005",
        title: "Subscription Cancellation",
        turns: &[
            (Role::Human, "I want to cancel my premium subscription."),
            (Role::Ai, "I understand you'd like to cancel your premium subscription. Before we proceed, may I ask if there's any specific issue or feature you're not satisfied with? Perhaps I can help address it."),
            (Role::Human, "I'm just not using it enough to justify the cost."),
            (Role::Ai, "I completely understand. Would you be interested in our basic plan at $4.99/month instead of canceling entirely? It still gives you access to core features at a lower cost."),
            (Role::Human, "No thanks, I'd prefer to cancel completely for now."),
            (Role::Ai, "No problem at all! I've processed your cancellation request. Your premium subscription will remain active until the end of your current billing period on March 15, 2024. After that, your account will revert to our free tier."),
            (Role::Human, "Will I lose my saved data?"),
            (Role::Ai, "No, you won't lose any data! All your saved information will remain in your account. You can always reactivate your premium subscription later if you change your mind, and everything will be just as you left it."),
        ],
    },
    SampleConversation {
        session_id: "session_006",
        title: "Technical Support",
        turns: &[
            (Role::System, "Customer connected from mobile device"),
            (Role::Human, "The app keeps crashing whenever I try to upload a photo."),
            (Role::Ai, "I'm sorry to hear you're experiencing crashes with photo uploads. Let me help you troubleshoot this. First, which device and app version are you using?"),
            (Role::Human, "iPhone 12, and I think the app version is 3.2.1"),
            (Role::Ai, "Thank you! Version 3.2.1 had a known issue with photo uploads. We've fixed this in version 3.2.3. Could you please update your app from the App Store?"),
            (Role::Human, "Updating now... Okay, it's done."),
            (Role::Ai, "Great! Now please try uploading a photo again. Make sure to grant the app permission to access your photos if prompted."),
            (Role::Human, "It works perfectly now! Thanks!"),
            (Role::Ai, "Wonderful! I'm glad the update resolved the issue. The new version also includes improved upload speeds and better image compression. If you experience any other problems, please don't hesitate to reach out!"),
        ],
    },
    SampleConversation {
        session_id: "session_007",
        title: "Payment Issue",
        turns: &[
            (Role::Human, "My credit card was charged twice for the same order."),
            (Role::Ai, "I apologize for the double charge issue. This must be concerning. Let me look into this immediately. Could you please provide your order number?"),
            (Role::Human, "Order #11111"),
            (Role::Ai, "Thank you. I can see order #11111 in our system for $149.99. I can confirm that there appears to be a duplicate charge. This sometimes happens due to a processing error."),
            (Role::Human, "When will I get my money back?"),
            (Role::Ai, "I've initiated an immediate refund for the duplicate charge of $149.99. Depending on your bank, you should see the credit within 2-5 business days. I've also added a $10 credit to your account for the inconvenience."),
            (Role::Human, "That's very helpful, thank you!"),
            (Role::Ai, "You're welcome! I've also sent a confirmation email with the refund details and reference number REF-2024-0307. If you don't see the refund after 5 business days, please contact us with this reference number."),
        ],
    },
    SampleConversation {
        session_id: "session_008",
        title: "Product Exchange",
        turns: &[
            (Role::Human, "I ordered a size M shirt but it's too small. Can I exchange it for size L?"),
            (Role::Ai, "Of course! I'd be happy to help you exchange your shirt for a size L. Is the item unused with tags still attached?"),
            (Role::Human, "Yes, I only tried it on once. Tags are still on."),
            (Role::Ai, "Perfect! I've initiated an exchange for you. You'll receive a prepaid shipping label via email within the next hour. Once we receive the size M, we'll immediately ship out the size L."),
            (Role::Human, "How long will the whole process take?"),
            (Role::Ai, "The typical exchange timeline is 7-10 business days from when you ship the item back. However, to expedite this for you, I've upgraded your exchange to priority processing, so you should receive your size L within 5-7 business days."),
            (Role::Human, "That's great, thanks for the fast service!"),
            (Role::Ai, "You're very welcome! I've also noted your size preference in your account to help with future orders. You'll receive tracking information as soon as your new shirt ships."),
        ],
    },
];

/// The canned data set.
#[must_use]
pub const fn sample_conversations() -> &'static [SampleConversation] {
    SAMPLES
}

/// Load the sample conversations into `store`.
///
/// Conversations that already hold messages are skipped, so running the seed
/// twice does not duplicate turns.
///
/// # Errors
/// Returns an error if storage access fails.
pub fn seed_store<S>(store: &mut S) -> StoreResult<SeedReport>
where
    S: ConversationStore + ?Sized,
{
    let conversation_metadata = json!({"source": "dummy_data", "created_by": "populate_script"});
    let message_metadata = json!({"generated": true});
    let mut report = SeedReport::default();

    for sample in SAMPLES {
        let session_id = SessionId::new(sample.session_id)?;
        let id = store.create_conversation(
            &session_id,
            Some(sample.title),
            Some(&conversation_metadata),
        )?;

        if !store.get_conversation_messages(&session_id)?.is_empty() {
            report.skipped.push(session_id);
            continue;
        }

        for (role, content) in sample.turns {
            store.add_message(id, *role, content, Some(&message_metadata))?;
        }
        report.messages += sample.turns.len();
        report.seeded.push(session_id);
    }

    info!(
        seeded = report.seeded.len(),
        skipped = report.skipped.len(),
        messages = report.messages,
        "Seeded sample conversations"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::storage::SqliteConversationStore;

    #[test]
    fn test_seed_is_repeatable() {
        let mut store = SqliteConversationStore::open_in_memory().unwrap();

        let first = seed_store(&mut store).unwrap();
        assert_eq!(first.seeded.len(), sample_conversations().len());
        assert!(first.skipped.is_empty());

        let second = seed_store(&mut store).unwrap();
        assert!(second.seeded.is_empty());
        assert_eq!(second.skipped.len(), sample_conversations().len());
        assert_eq!(second.messages, 0);

        let stats = store.stats().unwrap();
        assert_eq!(stats.messages, first.messages as u64);
    }

    #[test]
    fn test_seed_contains_refund_conversation() {
        let mut store = SqliteConversationStore::open_in_memory().unwrap();
        seed_store(&mut store).unwrap();

        let hits = store.search_messages("refund", 20).unwrap();
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|hit| hit.content.contains("refund")));
        assert!(
            hits.iter()
                .any(|hit| hit.session_id.as_str() == "session_001")
        );
    }

    #[test]
    fn test_seed_loads_full_support_data_set() {
        let mut store = SqliteConversationStore::open_in_memory().unwrap();
        let report = seed_store(&mut store).unwrap();
        assert_eq!(report.messages, 61);

        let stats = store.stats().unwrap();
        assert_eq!(stats.conversations, 8);
        assert_eq!(
            stats.messages_by_role,
            vec![(Role::Ai, 30), (Role::Human, 30), (Role::System, 1)]
        );

        let exchange = store
            .get_conversation_messages(&SessionId::new("session_003").unwrap())
            .unwrap();
        assert_eq!(exchange.len(), 8);
        assert!(exchange[7].content.contains("extended warranty"));

        let conversation = store
            .find_conversation(&SessionId::new("session_001").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(
            conversation.metadata,
            Some(json!({"source": "dummy_data", "created_by": "populate_script"}))
        );
    }

    #[test]
    fn test_seed_shipping_search() {
        let mut store = SqliteConversationStore::open_in_memory().unwrap();
        seed_store(&mut store).unwrap();

        let hits = store.search_messages("shipping", 3).unwrap();
        let mut sessions: Vec<&str> = hits.iter().map(|hit| hit.session_id.as_str()).collect();
        sessions.sort_unstable();
        assert_eq!(sessions, vec!["session_003", "session_008"]);
        assert!(hits.iter().all(|hit| hit.role == Role::Ai));
    }
}
