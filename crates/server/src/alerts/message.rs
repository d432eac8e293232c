//! Localized alert message composition.
//!
//! The message language follows the user's stored preference. An
//! unrecognized language code is a hard error for that alert attempt; there
//! is no silent fallback.

use crate::alerts::decision::AlertKind;
use crate::error::ComposeError;
use crate::snapshot::DomainSnapshot;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Ru,
    Uz,
}

impl FromStr for Locale {
    type Err = ComposeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "en" | "eng" => Ok(Locale::En),
            "ru" => Ok(Locale::Ru),
            "uz" => Ok(Locale::Uz),
            other => Err(ComposeError::UnsupportedLocale(other.to_string())),
        }
    }
}

/// A rendered alert, ready for any channel: mail uses subject + body, chat
/// channels use the body, the webhook payload carries all fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub domain: String,
    pub kind: AlertKind,
    pub subject: String,
    pub body: String,
}

/// Compose the localized notification for one domain alert.
pub fn compose(
    kind: AlertKind,
    domain: &str,
    current: &DomainSnapshot,
    locale: Locale,
    base_url: &str,
    now: OffsetDateTime,
) -> AlertMessage {
    let days_left = current
        .expires
        .map(|expires| (expires - now).whole_days())
        .unwrap_or(0);

    let greeting = match locale {
        Locale::En => format!("Hello \u{1F44B},\n\nYour tracked domain, {domain}, "),
        Locale::Ru => format!(
            "Здравствуйте \u{1F44B},\n\nВаш отслеживаемый домен, {domain}, "
        ),
        Locale::Uz => format!(
            "Assalomu Alaykum \u{1F44B},\n\nSiz kuzatayotgan domen, {domain}, "
        ),
    };

    let (subject, tail) = match (kind, locale) {
        (AlertKind::Expiry, Locale::En) => (
            format!("Certificate Alert: {domain} expires in {days_left} days"),
            format!(
                "has an upcoming SSL expiration. Only [{days_left}] days left. \
                 Act promptly - check details at [{base_url}]."
            ),
        ),
        (AlertKind::Expiry, Locale::Ru) => (
            format!("Сертификат {domain} истекает через {days_left} дн."),
            format!(
                "истекает срок действия SSL. Осталось всего [{days_left}] дней. \
                 Действуйте незамедлительно - проверьте подробности на [{base_url}]."
            ),
        ),
        (AlertKind::Expiry, Locale::Uz) => (
            format!("{domain} sertifikati {days_left} kundan keyin tugaydi"),
            format!(
                "yaqinlashib kelayotgan SSL muddati bor. Faqat [{days_left}] kun qoldi. \
                 Zudlik bilan harakat qiling - tafsilotlarni tekshiring [{base_url}]."
            ),
        ),
        (AlertKind::Change, Locale::En) => (
            format!("Certificate Alert: {domain} certificate changed"),
            format!("has changed its SSL certificate details. Review the changes at [{base_url}]."),
        ),
        (AlertKind::Change, Locale::Ru) => (
            format!("Сертификат домена {domain} изменился"),
            format!(
                "изменил данные своего SSL-сертификата. Проверьте изменения на [{base_url}]."
            ),
        ),
        (AlertKind::Change, Locale::Uz) => (
            format!("{domain} sertifikati o'zgardi"),
            format!(
                "SSL sertifikati ma'lumotlarini o'zgartirdi. \
                 O'zgarishlarni tekshiring [{base_url}]."
            ),
        ),
    };

    AlertMessage {
        domain: domain.to_string(),
        kind,
        subject,
        body: format!("{greeting}{tail}"),
    }
}
