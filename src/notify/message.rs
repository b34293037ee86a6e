//! Alert subjects and bodies.
//!
//! Every body ends with the same footer: wall-clock timestamp, location label
//! and GPIO pin, so a reader can tell which monitor sent it and when.

use std::time::Duration;

use chrono::{DateTime, Local};

use crate::state::Event;

/// Static facts about the monitor that appear in every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub location: String,
    pub pin: u32,
}

/// A composed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    /// Compose the message for a state machine event, stamped with the current local time.
    pub fn for_event(event: &Event, ctx: &MessageContext) -> Self {
        Self::for_event_at(event, ctx, Local::now())
    }

    pub fn for_event_at(event: &Event, ctx: &MessageContext, at: DateTime<Local>) -> Self {
        match event {
            Event::LowConfirmed { debounce } => low_water(*debounce, ctx, at),
            Event::Restored => restored(ctx, at),
        }
    }

    /// Compose a test message for checking delivery end to end.
    pub fn test(ctx: &MessageContext) -> Self {
        test_message(ctx, Local::now())
    }
}

fn low_water(debounce: Duration, ctx: &MessageContext, at: DateTime<Local>) -> AlertMessage {
    let message = format!(
        "WARNING: Water level has dropped below the safe threshold!

The float switch has detected low water for more than {} seconds.
Please refill the water container as soon as possible.

Action Required:
- Check water container
- Refill water if needed
- Verify float switch is working properly",
        debounce.as_secs()
    );

    AlertMessage {
        subject: "⚠️ ALERT: Water Level is LOW".to_string(),
        body: with_footer(&message, ctx, at),
    }
}

fn restored(ctx: &MessageContext, at: DateTime<Local>) -> AlertMessage {
    let message = "Good news! The water level has been restored to normal.

The float switch indicates the water container has been refilled.
System is now operating normally.";

    AlertMessage {
        subject: "✓ Water Level Restored".to_string(),
        body: with_footer(message, ctx, at),
    }
}

fn test_message(ctx: &MessageContext, at: DateTime<Local>) -> AlertMessage {
    let message = "This is a TEST email from your Water Level Monitor.

If you receive this email, your email notifications are configured correctly
and the monitor is ready to send alerts when the water level is low.";

    AlertMessage {
        subject: "🧪 Water Monitor - Test".to_string(),
        body: with_footer(message, ctx, at),
    }
}

fn with_footer(message: &str, ctx: &MessageContext, at: DateTime<Local>) -> String {
    format!(
        "{}

Timestamp: {}
Location: {}
GPIO Pin: {}

This is an automated alert from your Water Level Monitor.
",
        message,
        at.format("%Y-%m-%d %H:%M:%S"),
        ctx.location,
        ctx.pin
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx() -> MessageContext {
        MessageContext {
            location: "Greenhouse".to_string(),
            pin: 17,
        }
    }

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 0).unwrap()
    }

    #[test]
    fn test_low_water_message() {
        let event = Event::LowConfirmed {
            debounce: Duration::from_secs(15),
        };
        let msg = AlertMessage::for_event_at(&event, &ctx(), fixed_time());

        assert_eq!(msg.subject, "⚠️ ALERT: Water Level is LOW");
        assert!(msg.body.contains("low water for more than 15 seconds"));
        assert!(msg.body.contains("Refill water if needed"));
    }

    #[test]
    fn test_restored_message() {
        let msg = AlertMessage::for_event_at(&Event::Restored, &ctx(), fixed_time());

        assert_eq!(msg.subject, "✓ Water Level Restored");
        assert!(msg.body.contains("restored to normal"));
    }

    #[test]
    fn test_footer_fields() {
        let msg = AlertMessage::for_event_at(&Event::Restored, &ctx(), fixed_time());

        assert!(msg.body.contains("Timestamp: 2024-03-09 07:05:00"));
        assert!(msg.body.contains("Location: Greenhouse"));
        assert!(msg.body.contains("GPIO Pin: 17"));
        assert!(msg.body.ends_with("automated alert from your Water Level Monitor.\n"));
    }

    #[test]
    fn test_test_message() {
        let msg = AlertMessage::test(&ctx());
        assert!(msg.subject.contains("Test"));
        assert!(msg.body.contains("GPIO Pin: 17"));
    }
}
