//! Output script classification and address encoding
//!
//! Thin layer over the `bitcoin` crate. Only P2PKH, P2SH and P2TR are treated
//! as address-type scripts; everything else is passed through untouched.

use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, AddressType, Network, Script, ScriptBuf};
use std::fmt;
use std::str::FromStr;

/// Script kinds the indexer can be queried by
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptType {
    P2pkh,
    P2sh,
    P2tr,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P2pkh => "p2pkh",
            Self::P2sh => "p2sh",
            Self::P2tr => "p2tr",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Script type and hex payload identifying an address at the indexer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptKey {
    pub script_type: ScriptType,
    pub payload: String,
}

#[derive(Clone, Copy, Debug)]
pub struct ScriptCodec {
    network: Network,
}

impl ScriptCodec {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Decode an indexer hex script; `None` for malformed hex
    pub fn parse_hex(hex_script: &str) -> Option<ScriptBuf> {
        hex::decode(hex_script).ok().map(ScriptBuf::from_bytes)
    }

    /// Script starts with OP_RETURN
    pub fn is_data_carrying(script: &Script) -> bool {
        script.is_op_return()
    }

    pub fn is_address_script(script: &Script) -> bool {
        script.is_p2pkh() || script.is_p2sh() || script.is_p2tr()
    }

    /// Address for a P2PKH/P2SH/P2TR script on the configured network
    pub fn address_from_script(&self, script: &Script) -> Option<String> {
        if !Self::is_address_script(script) {
            return None;
        }
        Address::from_script(script, self.network)
            .ok()
            .map(|address| address.to_string())
    }

    fn parse_address(&self, address: &str) -> Option<Address> {
        Address::<NetworkUnchecked>::from_str(address)
            .ok()?
            .require_network(self.network)
            .ok()
    }

    pub fn is_valid_address(&self, address: &str) -> bool {
        self.script_key(address).is_some()
    }

    /// Script type and payload for a supported address
    pub fn script_key(&self, address: &str) -> Option<ScriptKey> {
        let address = self.parse_address(address)?;
        let script = address.script_pubkey();
        let bytes = script.as_bytes();

        let (script_type, payload) = match address.address_type()? {
            AddressType::P2pkh => (ScriptType::P2pkh, &bytes[3..23]),
            AddressType::P2sh => (ScriptType::P2sh, &bytes[2..22]),
            AddressType::P2tr => (ScriptType::P2tr, &bytes[2..34]),
            _ => return None,
        };

        Some(ScriptKey {
            script_type,
            payload: hex::encode(payload),
        })
    }
}
