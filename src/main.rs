// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use seqprop::errors::SeqPropError;

fn main() -> Result<(), SeqPropError> {
    seqprop::run()
}
