use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: Option<String>,

    #[sea_orm(unique)]
    pub phone_number: Option<String>,

    pub name: Option<String>,

    /// Always null for OTP-only accounts; present for parity with the other
    /// identity records.
    pub password_hash: Option<String>,

    pub is_active: bool,

    pub phone_verified: bool,

    /// Current login OTP (phone or email channel). Overwritten on every
    /// issue, never cleared.
    pub otp: Option<String>,

    /// RFC3339; non-null whenever `otp` is set.
    pub otp_expires_at: Option<String>,

    /// Counts OTP issuance and failed verifications in one field.
    pub otp_attempts: i32,

    pub web_otp: Option<String>,

    /// RFC3339; non-null whenever `web_otp` is set.
    pub web_otp_expires_at: Option<String>,

    pub web_otp_attempts: i32,

    /// Set only after a successful activation-code redemption.
    pub organization_id: Option<i32>,

    pub batch_id: Option<i32>,

    pub live_class_enabled: bool,

    /// Failed organization-join attempts; separate from the OTP counters.
    pub activation_attempts: i32,

    pub last_web_login_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Organizations,
    #[sea_orm(
        belongs_to = "super::batches::Entity",
        from = "Column::BatchId",
        to = "super::batches::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Batches,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::batches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
