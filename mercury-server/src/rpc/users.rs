//! Operations in the `users.` namespace.

use mercury_tl::{Cursor, Deserializable, Identifiable, Serializable, enums, functions, types};

use super::{Operation, RunContext};
use crate::rpc::error::RpcError;

/// A parsed `users.*` call, ready to run.
pub enum UsersOperation {
    GetFullUser(functions::users::GetFullUser),
    GetUsers(functions::users::GetUsers),
}

/// Function ids this namespace serves.
pub const FUNCTION_IDS: &[u32] = &[
    functions::users::GetFullUser::CONSTRUCTOR_ID,
    functions::users::GetUsers::CONSTRUCTOR_ID,
];

/// Parse the typed argument for `id` and record which run step executes.
pub fn factory(id: u32, cur: &mut Cursor<'_>) -> mercury_tl::deserialize::Result<Operation> {
    let op = if id == functions::users::GetFullUser::CONSTRUCTOR_ID {
        UsersOperation::GetFullUser(functions::users::GetFullUser::deserialize(cur)?)
    } else if id == functions::users::GetUsers::CONSTRUCTOR_ID {
        UsersOperation::GetUsers(functions::users::GetUsers::deserialize(cur)?)
    } else {
        return Err(mercury_tl::deserialize::Error::UnexpectedConstructor { id });
    };
    Ok(Operation::Users(op))
}

impl UsersOperation {
    pub fn run(self, ctx: &RunContext<'_>) -> Result<Vec<u8>, RpcError> {
        match self {
            Self::GetFullUser(req) => run_get_full_user(req, ctx),
            Self::GetUsers(req) => run_get_users(req, ctx),
        }
    }
}

fn run_get_full_user(
    req: functions::users::GetFullUser,
    ctx: &RunContext<'_>,
) -> Result<Vec<u8>, RpcError> {
    let user = ctx.api.get_user(&req.id, ctx.requester).ok_or_else(RpcError::user_id_invalid)?;

    Ok(enums::UserFull::UserFull(types::UserFull {
        user: user.to_tl(ctx.requester),
        about: None,
        common_chats_count: 0,
    })
    .to_bytes())
}

fn run_get_users(
    req: functions::users::GetUsers,
    ctx: &RunContext<'_>,
) -> Result<Vec<u8>, RpcError> {
    let mut result = Vec::with_capacity(req.id.len());
    for input in &req.id {
        let user = ctx.api.get_user(input, ctx.requester).ok_or_else(RpcError::user_id_invalid)?;
        result.push(user.to_tl(ctx.requester));
    }
    Ok(result.to_bytes())
}
