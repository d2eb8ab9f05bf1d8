/// Coarse classification of an [`AppError`], used by presentation code to
/// pick how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    PolicyViolation,
    AccountBanned,
    Unauthorized,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Account not found. Please Sign Up.")]
    AccountNotFound,

    #[error("Incorrect Password.")]
    IncorrectPassword,

    #[error("Incorrect Admin Password.")]
    IncorrectAdminPassword,

    #[error("Account Banned: {0}")]
    AccountBanned(String),

    #[error("Email already registered. Please login.")]
    DuplicateEmail,

    #[error("Username already taken.")]
    DuplicateUsername,

    #[error("Invalid Verification Code.")]
    InvalidVerificationCode,

    #[error("Insufficient balance! Add money to wallet.")]
    InsufficientBalance,

    #[error("You are already registered for this tournament.")]
    AlreadyRegistered,

    #[error("You must create or join a team first!")]
    NoTeam,

    #[error("Only the Team Captain ({0}) can register for matches.")]
    NotCaptain(String),

    #[error("Your team is already registered!")]
    TeamAlreadyRegistered,

    #[error("Please submit a request for this VIP Match.")]
    VipRequiresApproval,

    #[error("Team is full.")]
    TeamFull,

    #[error("You are already in a team. Leave it first.")]
    AlreadyInTeam,

    #[error("Cannot move request from {from} to {to}.")]
    InvalidTransition { from: String, to: String },

    #[error("Please login first.")]
    NotAuthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) | AppError::InvalidVerificationCode => ErrorKind::Validation,
            AppError::NotFound(_) | AppError::AccountNotFound => ErrorKind::NotFound,
            AppError::IncorrectPassword
            | AppError::IncorrectAdminPassword
            | AppError::NotAuthenticated
            | AppError::Forbidden(_) => ErrorKind::Unauthorized,
            AppError::AccountBanned(_) => ErrorKind::AccountBanned,
            AppError::DuplicateEmail
            | AppError::DuplicateUsername
            | AppError::InsufficientBalance
            | AppError::AlreadyRegistered
            | AppError::NoTeam
            | AppError::NotCaptain(_)
            | AppError::TeamAlreadyRegistered
            | AppError::VipRequiresApproval
            | AppError::TeamFull
            | AppError::AlreadyInTeam
            | AppError::InvalidTransition { .. } => ErrorKind::PolicyViolation,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
