mod watchpoint_test;
