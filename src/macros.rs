//! Macros to reduce boilerplate in the codebase

/// Run a block with `$R` bound to the concrete record type of a
/// [`ResourceKind`](crate::resources::ResourceKind).
///
/// # Usage
///
/// ```rust,ignore
/// with_resource!(kind, R => {
///     let client = HttpClient::from_config(&config)?;
///     list_records::<R>(&client, options).await
/// })
/// ```
#[macro_export]
macro_rules! with_resource {
    ($kind:expr, $R:ident => $body:expr) => {
        match $kind {
            $crate::resources::ResourceKind::Patients => {
                type $R = $crate::resources::Patient;
                $body
            }
            $crate::resources::ResourceKind::Doctors => {
                type $R = $crate::resources::Doctor;
                $body
            }
            $crate::resources::ResourceKind::Insurances => {
                type $R = $crate::resources::Insurance;
                $body
            }
            $crate::resources::ResourceKind::Analyses => {
                type $R = $crate::resources::Analysis;
                $body
            }
            $crate::resources::ResourceKind::AuditLogs => {
                type $R = $crate::resources::AuditLogEntry;
                $body
            }
        }
    };
}
