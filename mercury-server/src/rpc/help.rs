//! Operations in the `help.` namespace.

use std::time::{SystemTime, UNIX_EPOCH};

use mercury_tl::{Cursor, Deserializable, Identifiable, Serializable, enums, functions, types};

use super::{Operation, RunContext};
use crate::rpc::error::RpcError;

/// A parsed `help.*` call, ready to run.
pub enum HelpOperation {
    GetConfig(functions::help::GetConfig),
    GetNearestDc(functions::help::GetNearestDc),
}

/// Function ids this namespace serves.
pub const FUNCTION_IDS: &[u32] = &[
    functions::help::GetConfig::CONSTRUCTOR_ID,
    functions::help::GetNearestDc::CONSTRUCTOR_ID,
];

/// Parse the typed argument for `id` and record which run step executes.
pub fn factory(id: u32, cur: &mut Cursor<'_>) -> mercury_tl::deserialize::Result<Operation> {
    let op = if id == functions::help::GetConfig::CONSTRUCTOR_ID {
        HelpOperation::GetConfig(functions::help::GetConfig::deserialize(cur)?)
    } else if id == functions::help::GetNearestDc::CONSTRUCTOR_ID {
        HelpOperation::GetNearestDc(functions::help::GetNearestDc::deserialize(cur)?)
    } else {
        return Err(mercury_tl::deserialize::Error::UnexpectedConstructor { id });
    };
    Ok(Operation::Help(op))
}

impl HelpOperation {
    pub fn run(self, ctx: &RunContext<'_>) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::GetConfig(_) => Ok(run_get_config(ctx)),
            Self::GetNearestDc(_) => Ok(run_get_nearest_dc(ctx)),
        }
    }
}

fn run_get_config(ctx: &RunContext<'_>) -> Vec<u8> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i32;
    let dc_options = ctx
        .api
        .dc_configuration()
        .options
        .iter()
        .map(|opt| {
            enums::DcOption::DcOption(types::DcOption {
                ipv6: opt.flags.contains(mercury_mtproto::dc::DcFlags::IPV6_ONLY),
                media_only: opt.flags.contains(mercury_mtproto::dc::DcFlags::MEDIA_ONLY),
                id: opt.id as i32,
                ip_address: opt.address.clone(),
                port: opt.port as i32,
            })
        })
        .collect();

    enums::Config::Config(types::Config {
        date: now,
        expires: now + 3600,
        test_mode: false,
        this_dc: ctx.api.config().this_dc as i32,
        dc_options,
        chat_size_max: 200,
        megagroup_size_max: 100_000,
        offline_blur_timeout_ms: 5_000,
    })
    .to_bytes()
}

fn run_get_nearest_dc(ctx: &RunContext<'_>) -> Vec<u8> {
    let this_dc = ctx.api.config().this_dc as i32;
    enums::NearestDc::NearestDc(types::NearestDc {
        country: String::new(),
        this_dc,
        nearest_dc: this_dc,
    })
    .to_bytes()
}
