// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

pub async fn health() -> &'static str {
    "OK"
}
