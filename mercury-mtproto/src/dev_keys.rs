//! Built-in development RSA keypair.
//!
//! Real deployments configure their own key material; the bundled server
//! binary and the test suites fall back to this 2048-bit pair so a client
//! and server built from this workspace can talk to each other out of the
//! box. Do not reuse it anywhere that matters.

use mercury_crypto::rsa;

pub const RSA_N: &str = "24396319854592500247627051595509523474048022946460280365205929366216259040450271869157383040399373958098174292724255594382637565647767653163018820474023258432549676519958538399893003865888368594106882456148411030628690464730948977282872780498593591097246801843464519089268377682118559305968000793174732200388206256313084995998860040854278267624090054127565508386015027648815077555500527042521096478808953245977478009007621322452448301028744768444558907670608800056657529218939831805906468893189256954975048161457168462423374076179329809638294771462090048191852751998219601268157064371310222338520483442957578361374683";

pub const RSA_E: &str = "65537";

pub const RSA_D: &str = "510730592497381789519573901598166931754488113318331700582305187763381103857329035575078650707660421906872379413425678250346807758498820820905165352249262410080689628536294225928150530295845731588486545460360100920435224645785769822117299462045415673366535119539089677441387524297216280387996049380284916595696925570526310165483303133892874252342038869045002432374190406204079842352425261100007118596116557627195865775814976416140784494694816532238887386220380979047063924952388438573659645950960786430787561181980060577524067749494057123476911313884541552606308221834111942157718228256037107811504119351733582185601";

/// The development key with its private part, for serving.
pub fn private_key() -> rsa::Key {
    rsa::Key::new_private(RSA_N, RSA_E, RSA_D).expect("embedded key parses")
}

/// The development key's public half, for clients.
pub fn public_key() -> rsa::Key {
    rsa::Key::new(RSA_N, RSA_E).expect("embedded key parses")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halves_share_a_fingerprint() {
        assert_eq!(private_key().fingerprint(), public_key().fingerprint());
        assert!(private_key().has_private_part());
    }
}
