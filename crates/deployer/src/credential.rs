use {
    crate::Error,
    alloy::{primitives::Address, signers::local::PrivateKeySigner},
    std::{fmt, str::FromStr},
};

/// The private key the deployment transaction is signed with.
///
/// Neither `Debug` nor `Display` ever print the key itself.
#[derive(Clone)]
pub struct Credential(PrivateKeySigner);

impl Credential {
    /// The account address derived from the key.
    pub fn address(&self) -> Address {
        self.0.address()
    }

    pub(crate) fn signer(&self) -> &PrivateKeySigner {
        &self.0
    }
}

impl FromStr for Credential {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        key.trim()
            .parse::<PrivateKeySigner>()
            .map(Self)
            .map_err(|err| Error::InvalidCredential(err.to_string()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.address()).finish()
    }
}
