use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_auto(User::Id).big_integer().to_owned())
                    .col(string(User::Email).not_null().unique_key().to_owned())
                    .col(timestamp_null(User::LastPollAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrackedDomain::Table)
                    .if_not_exists()
                    .col(pk_auto(TrackedDomain::Id).big_integer().to_owned())
                    .col(big_integer(TrackedDomain::UserId).not_null().to_owned())
                    .col(string(TrackedDomain::DomainName).not_null().to_owned())
                    .col(string_null(TrackedDomain::RemoteAddr))
                    .col(string_null(TrackedDomain::Issuer))
                    .col(string_null(TrackedDomain::SignatureAlgo))
                    .col(string_null(TrackedDomain::PublicKeyAlgo))
                    .col(string_null(TrackedDomain::PublicKeyType))
                    .col(text_null(TrackedDomain::EncodedPem))
                    .col(string_null(TrackedDomain::SignatureSha1))
                    .col(string_null(TrackedDomain::DnsNames))
                    .col(string_null(TrackedDomain::KeyUsage))
                    .col(string_null(TrackedDomain::ExtKeyUsages))
                    .col(timestamp_null(TrackedDomain::Issued))
                    .col(timestamp_null(TrackedDomain::Expires))
                    .col(big_integer_null(TrackedDomain::LatencyMs))
                    .col(timestamp_null(TrackedDomain::LastPollAt))
                    .col(string_null(TrackedDomain::Error))
                    .col(string_null(TrackedDomain::Status))
                    .col(timestamp_null(TrackedDomain::LastAlertTime))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_user_domain_unique")
                    .table(TrackedDomain::Table)
                    .col(TrackedDomain::UserId)
                    .col(TrackedDomain::DomainName)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NotificationPreference::Table)
                    .if_not_exists()
                    .col(
                        big_integer(NotificationPreference::UserId)
                            .not_null()
                            .primary_key()
                            .to_owned(),
                    )
                    .col(
                        boolean(NotificationPreference::ExpiryAlerts)
                            .default(true)
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        boolean(NotificationPreference::ChangeAlert)
                            .default(true)
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        integer(NotificationPreference::BeforeDays)
                            .default(7)
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        boolean(NotificationPreference::EmailAlert)
                            .default(true)
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        boolean(NotificationPreference::TelegramAlert)
                            .default(false)
                            .not_null()
                            .to_owned(),
                    )
                    .col(
                        boolean(NotificationPreference::WebhookAlert)
                            .default(false)
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChannelIdentity::Table)
                    .if_not_exists()
                    .col(pk_auto(ChannelIdentity::Id).big_integer().to_owned())
                    .col(
                        big_integer(ChannelIdentity::UserId)
                            .not_null()
                            .unique_key()
                            .to_owned(),
                    )
                    .col(big_integer_null(ChannelIdentity::ChatId))
                    .col(string(ChannelIdentity::Lang).not_null().to_owned())
                    .col(string_null(ChannelIdentity::WebhookUrl))
                    .col(
                        timestamp(ChannelIdentity::CreatedAt)
                            .default(Expr::current_timestamp())
                            .not_null()
                            .to_owned(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChannelIdentity::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NotificationPreference::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_user_domain_unique")
                    .table(TrackedDomain::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(TrackedDomain::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
    Email,
    LastPollAt,
}

#[derive(Iden)]
enum TrackedDomain {
    Table,
    Id,
    UserId,
    DomainName,
    RemoteAddr,
    Issuer,
    SignatureAlgo,
    PublicKeyAlgo,
    PublicKeyType,
    EncodedPem,
    SignatureSha1,
    DnsNames,
    KeyUsage,
    ExtKeyUsages,
    Issued,
    Expires,
    LatencyMs,
    LastPollAt,
    Error,
    Status,
    LastAlertTime,
}

#[derive(Iden)]
enum NotificationPreference {
    Table,
    UserId,
    ExpiryAlerts,
    ChangeAlert,
    BeforeDays,
    EmailAlert,
    TelegramAlert,
    WebhookAlert,
}

#[derive(Iden)]
enum ChannelIdentity {
    Table,
    Id,
    UserId,
    ChatId,
    Lang,
    WebhookUrl,
    CreatedAt,
}
